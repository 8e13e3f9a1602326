// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prompt Template Engine
//!
//! Renders the text files of a bundle (agent prompts and the README) with
//! Handlebars.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Transform compiled prompt descriptors into prompt files
//! - **Integration:** Compiler prompt artifacts → `prompts/<stage>/<variant>.md`
//!
//! # Supported Placeholders
//!
//! - `{{agent_name}}` - Display name of the agent
//! - `{{variant_title}}` - Title-cased variant (`scholar_primary` → `Scholar Primary`)
//! - `{{stage_label}}` - Human stage label
//! - `{{policy_lines}}` - One `- <policy>` line per policy token
//!
//! Escaping is disabled: prompts are Markdown, not HTML.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

use crate::domain::identifiers::title_case;

const AGENT_PROMPT: &str = "agent_prompt";
const BUNDLE_README: &str = "bundle_readme";

const AGENT_PROMPT_TEMPLATE: &str = "# {{agent_name}} :: {{variant_title}}
Stage: {{stage_label}}

## Objectives
- Maintain evidence alignment and governance compliance.
- Respect orchestration policies while completing assigned actions.

## Policy Context
{{policy_lines}}

## Required Outputs
- Structured summary of findings.
- Confidence score with supporting evidence identifiers.
- Next-step recommendation or escalation flag.
";

const BUNDLE_README_TEMPLATE: &str = "# {{name}}

{{description}}

## Contents
- agents/: Spec files for every orchestration agent.
- prompts/: Prompt templates grouped by stage.
- flows/: Pipeline, feedback, and parallel execution descriptors.
- gates/: Execution gates guarding stage transitions.
- policies/: Governance snapshot applied during orchestration.
- tests/: Declarative bundle checks (`aether verify`).
- orchestration_summary.json: Node, edge, and policy overview.
";

const DEFAULT_DESCRIPTION: &str = "Autogenerated orchestration bundle.";

// ============================================================================
// Template Context
// ============================================================================

/// Context data for agent prompt rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContext {
    pub agent_name: String,
    pub variant_title: String,
    pub stage_label: String,
    pub policy_lines: String,
}

impl PromptContext {
    pub fn new(
        agent_name: impl Into<String>,
        variant: &str,
        stage_label: impl Into<String>,
        policies: &[String],
    ) -> Self {
        let policy_lines = if policies.is_empty() {
            "- (no explicit policies)".to_string()
        } else {
            policies
                .iter()
                .map(|policy| format!("- {}", policy))
                .collect::<Vec<_>>()
                .join("\n")
        };

        Self {
            agent_name: agent_name.into(),
            variant_title: title_case(variant),
            stage_label: stage_label.into(),
            policy_lines,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadmeContext {
    pub name: String,
    pub description: String,
}

impl ReadmeContext {
    pub fn new(name: impl Into<String>, description: &str) -> Self {
        let description = if description.trim().is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description.to_string()
        };
        Self {
            name: name.into(),
            description,
        }
    }
}

// ============================================================================
// Template Engine
// ============================================================================

pub struct PromptTemplateEngine {
    handlebars: Handlebars<'static>,
}

impl PromptTemplateEngine {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string(AGENT_PROMPT, AGENT_PROMPT_TEMPLATE)
            .context("Invalid agent prompt template")?;
        handlebars
            .register_template_string(BUNDLE_README, BUNDLE_README_TEMPLATE)
            .context("Invalid bundle README template")?;

        Ok(Self { handlebars })
    }

    pub fn render_prompt(&self, context: &PromptContext) -> Result<String> {
        self.handlebars
            .render(AGENT_PROMPT, context)
            .context("Failed to render agent prompt")
    }

    pub fn render_readme(&self, context: &ReadmeContext) -> Result<String> {
        self.handlebars
            .render(BUNDLE_README, context)
            .context("Failed to render bundle README")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_rendering() {
        let engine = PromptTemplateEngine::new().unwrap();
        let context = PromptContext::new(
            "Scholar Agent",
            "scholar_agent_primary",
            "Literature Search",
            &["policy.research_depth".to_string(), "policy.a&b".to_string()],
        );

        let result = engine.render_prompt(&context).unwrap();

        assert!(result.starts_with("# Scholar Agent :: Scholar Agent Primary\nStage: Literature Search\n\n"));
        assert!(result.contains("## Policy Context\n- policy.research_depth\n- policy.a&b\n\n## Required Outputs"));
        assert!(result.ends_with("- Next-step recommendation or escalation flag.\n"));
    }

    #[test]
    fn test_prompt_without_policies() {
        let engine = PromptTemplateEngine::new().unwrap();
        let context = PromptContext::new("Web", "web_fallback", "Search", &[]);
        let result = engine.render_prompt(&context).unwrap();
        assert!(result.contains("## Policy Context\n- (no explicit policies)\n"));
    }

    #[test]
    fn test_readme_default_description() {
        let engine = PromptTemplateEngine::new().unwrap();
        let result = engine
            .render_readme(&ReadmeContext::new("Research <Orchestrator>", "  "))
            .unwrap();
        assert!(result.starts_with("# Research <Orchestrator>\n\nAutogenerated orchestration bundle.\n"));
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Spec Documents
//!
//! Per-agent `.acl` files (YAML with a top-level `agent:` key). The writer
//! emits every field; the executor reads only `id`, `stage`, `prompts` and
//! `depends_on`, so everything else is optional on the way in.

use serde::{Deserialize, Serialize};

use crate::domain::blueprint::{AgentBlueprint, AgentCategory, RetryPolicy};
use crate::domain::identifiers::AgentId;

pub const SPEC_EXTENSION: &str = "acl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpecDocument {
    pub agent: AgentSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: AgentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub stage_label: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<AgentId>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Bundle-relative prompt paths; the first is primary.
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub category: AgentCategory,
}

fn default_concurrency() -> u32 {
    1
}

impl AgentSpec {
    pub fn primary_prompt(&self) -> Option<&str> {
        self.prompts.first().map(String::as_str)
    }
}

impl From<&AgentBlueprint> for AgentSpecDocument {
    fn from(agent: &AgentBlueprint) -> Self {
        Self {
            agent: AgentSpec {
                id: agent.identifier.clone(),
                name: agent.name.clone(),
                stage: agent.stage.clone(),
                stage_label: agent.stage_label.clone(),
                role: agent.role.clone(),
                description: agent.description.clone(),
                capabilities: agent.capabilities.clone(),
                policies: agent.policies.clone(),
                depends_on: agent.depends_on.clone(),
                inputs: agent.inputs.clone(),
                outputs: agent.outputs.clone(),
                prompts: agent.prompt_paths(),
                concurrency: agent.concurrency,
                retry: agent.retry.clone(),
                category: agent.category,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_spec_document() {
        let yaml = r#"
agent:
  id: search.scholar_agent
  stage: search
  prompts:
    - prompts/search/scholar_agent_primary.md
  depends_on: [search.coordinator]
"#;
        let doc: AgentSpecDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.agent.id.as_str(), "search.scholar_agent");
        assert_eq!(
            doc.agent.primary_prompt(),
            Some("prompts/search/scholar_agent_primary.md")
        );
        assert_eq!(doc.agent.concurrency, 1);
        assert_eq!(doc.agent.retry, RetryPolicy::stage_default());
    }

    #[test]
    fn test_spec_without_id_is_rejected() {
        let yaml = "agent:\n  stage: search\n";
        assert!(serde_yaml::from_str::<AgentSpecDocument>(yaml).is_err());
    }
}

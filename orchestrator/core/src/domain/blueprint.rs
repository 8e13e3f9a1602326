// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Blueprints
//!
//! Fully resolved agent descriptions produced by the compiler, and the stage
//! aggregate that groups specialists under one coordinator.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Blueprint, stage and retry value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::identifiers::{slugify, AgentId};

/// Role an agent plays in the orchestration topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentCategory {
    #[default]
    Stage,
    Coordinator,
    Supervisor,
    Observer,
    Governance,
    Resilience,
    Analysis,
    Support,
}

impl AgentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Coordinator => "coordinator",
            Self::Supervisor => "supervisor",
            Self::Observer => "observer",
            Self::Governance => "governance",
            Self::Resilience => "resilience",
            Self::Analysis => "analysis",
            Self::Support => "support",
        }
    }
}

impl fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stage" => Ok(Self::Stage),
            "coordinator" => Ok(Self::Coordinator),
            "supervisor" => Ok(Self::Supervisor),
            "observer" => Ok(Self::Observer),
            "governance" => Ok(Self::Governance),
            "resilience" => Ok(Self::Resilience),
            "analysis" => Ok(Self::Analysis),
            "support" => Ok(Self::Support),
            other => Err(format!("unknown agent category '{}'", other)),
        }
    }
}

/// Retry metadata carried by every blueprint.
///
/// The executor never retries; this is modeled configuration for the
/// retry manager agent and downstream schedulers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub strategy: String,
    pub cooldown_seconds: u64,
}

impl RetryPolicy {
    pub fn stage_default() -> Self {
        Self {
            max_attempts: 3,
            strategy: "exponential".to_string(),
            cooldown_seconds: 15,
        }
    }

    pub fn global_default() -> Self {
        Self {
            max_attempts: 5,
            strategy: "exponential".to_string(),
            cooldown_seconds: 30,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::stage_default()
    }
}

/// A compiled agent. Created by the compiler, never mutated once the
/// compiled orchestration is handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentBlueprint {
    pub identifier: AgentId,
    pub name: String,
    pub stage: String,
    pub stage_label: String,
    pub role: String,
    pub description: String,
    pub policies: Vec<String>,
    pub depends_on: Vec<AgentId>,
    /// Documentation hint, not enforced at runtime.
    pub max_dependency_degree: u32,
    /// First entry is the primary prompt the executor consumes.
    pub prompt_variants: Vec<String>,
    pub concurrency: u32,
    pub retry: RetryPolicy,
    pub capabilities: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub category: AgentCategory,
}

impl AgentBlueprint {
    /// Bundle-relative prompt path for a variant (`prompts/<stage>/<variant>.md`).
    pub fn prompt_path(&self, variant: &str) -> String {
        format!("prompts/{}/{}.md", self.stage, variant)
    }

    /// Prompt paths in variant order.
    pub fn prompt_paths(&self) -> Vec<String> {
        self.prompt_variants
            .iter()
            .map(|variant| self.prompt_path(variant))
            .collect()
    }

    /// Bundle-relative spec path (`agents/<stage>/<slug(name)>.acl`).
    pub fn spec_path(&self) -> String {
        format!("agents/{}/{}.acl", self.stage, slugify(&self.name))
    }
}

/// One pipeline stage: ordered specialists plus exactly one coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub key: String,
    pub label: String,
    pub agents: Vec<AgentBlueprint>,
    pub coordinator: AgentBlueprint,
    pub concurrency: u32,
    pub retry: RetryPolicy,
}

impl StageSpec {
    /// Specialists in declared order, then the coordinator.
    pub fn blueprints(&self) -> impl Iterator<Item = &AgentBlueprint> {
        self.agents.iter().chain(std::iter::once(&self.coordinator))
    }

    pub fn specialist_ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|a| a.identifier.clone()).collect()
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Orchestration Manifest
//!
//! The node + edge + policy overview written to `orchestration_summary.json`,
//! and the reduced manifest flat seeds produce.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Manifest documents and the policy histogram

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::blueprint::{AgentBlueprint, AgentCategory};
use crate::domain::graph::Edge;
use crate::domain::identifiers::AgentId;

pub const MANIFEST_FILE: &str = "orchestration_summary.json";
pub const FLAT_MANIFEST_FILE: &str = "orchestration_build.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    pub id: AgentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub policy_pack_ids: Vec<String>,
    #[serde(default)]
    pub max_dependency_degree: u32,
    #[serde(default)]
    pub depends_on: Vec<AgentId>,
    #[serde(default)]
    pub category: AgentCategory,
}

impl From<&AgentBlueprint> for ManifestNode {
    fn from(agent: &AgentBlueprint) -> Self {
        Self {
            id: agent.identifier.clone(),
            name: agent.name.clone(),
            stage: agent.stage.clone(),
            role: agent.role.clone(),
            policy_pack_ids: agent.policies.clone(),
            max_dependency_degree: agent.max_dependency_degree,
            depends_on: agent.depends_on.clone(),
            category: agent.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ManifestMetadata {
    pub stage_count: usize,
    pub agent_count: usize,
    pub policy_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<ManifestNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub policy_summary: BTreeMap<String, usize>,
    #[serde(default)]
    pub metadata: ManifestMetadata,
}

impl OrchestrationManifest {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        agents: &[&AgentBlueprint],
        edges: Vec<Edge>,
        stage_count: usize,
    ) -> Self {
        let policy_summary = summarize_policies(agents.iter().map(|a| a.policies.as_slice()));
        let nodes: Vec<ManifestNode> = agents.iter().map(|agent| ManifestNode::from(*agent)).collect();
        let metadata = ManifestMetadata {
            stage_count,
            agent_count: nodes.len(),
            policy_keys: policy_summary.keys().cloned().collect(),
        };

        Self {
            name: name.into(),
            description: description.into(),
            nodes,
            edges,
            policy_summary,
            metadata,
        }
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &AgentId> {
        self.nodes.iter().map(|node| &node.id)
    }
}

/// Node shape for flat seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode {
    pub id: AgentId,
    pub role: String,
    pub policy_pack_ids: Vec<String>,
    pub max_dependency_degree: Option<u32>,
}

/// Manifest written for flat seeds; no bundle accompanies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatGraphManifest {
    pub nodes: Vec<FlatNode>,
    pub edges: Vec<Edge>,
    pub policy_summary: BTreeMap<String, usize>,
}

/// Histogram: policy token -> number of agents carrying it, sorted by token.
pub fn summarize_policies<'a, I>(policy_lists: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut summary = BTreeMap::new();
    for policies in policy_lists {
        for policy in policies {
            *summary.entry(policy.clone()).or_insert(0) += 1;
        }
    }
    summary
}

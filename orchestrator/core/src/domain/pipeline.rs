// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pipeline Descriptors
//!
//! The flow documents under `flows/`. Only [`PipelineFlow`] is consumed by
//! the executor; feedback loops and parallel groups are advisory metadata.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Flow, feedback loop and parallel group descriptors

use serde::{Deserialize, Serialize};

use crate::domain::blueprint::{AgentBlueprint, StageSpec};
use crate::domain::graph::Edge;
use crate::domain::identifiers::AgentId;

pub const PIPELINE_FILE: &str = "flows/main_pipeline.yaml";
pub const FEEDBACK_LOOPS_FILE: &str = "flows/feedback_loops.yaml";
pub const PARALLEL_GROUPS_FILE: &str = "flows/parallel_execution.yaml";

pub const ANALYSIS_STAGE: &str = "analysis";
pub const VALIDATION_STAGE: &str = "validation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub agents: Vec<AgentId>,
    #[serde(default)]
    pub coordinator: Option<AgentId>,
}

/// Stages in execution order plus the global agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineFlow {
    #[serde(default)]
    pub stages: Vec<PipelineStage>,
    #[serde(default)]
    pub global_agents: Vec<AgentId>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl PipelineFlow {
    pub fn new(stages: &[StageSpec], global_agents: &[AgentBlueprint], edges: Vec<Edge>) -> Self {
        Self {
            stages: stages
                .iter()
                .map(|stage| PipelineStage {
                    key: stage.key.clone(),
                    label: stage.label.clone(),
                    agents: stage.specialist_ids(),
                    coordinator: Some(stage.coordinator.identifier.clone()),
                })
                .collect(),
            global_agents: global_agents.iter().map(|a| a.identifier.clone()).collect(),
            edges,
        }
    }
}

// ============================================================================
// Feedback loops
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossStageLoop {
    pub name: String,
    pub sources: Vec<AgentId>,
    pub targets: Vec<AgentId>,
    pub mode: String,
    pub criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryLoop {
    pub name: String,
    pub stage: String,
    pub manager: AgentId,
    pub trigger: String,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackLoop {
    CrossStage(CrossStageLoop),
    Retry(RetryLoop),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FeedbackLoops {
    pub loops: Vec<FeedbackLoop>,
}

impl FeedbackLoops {
    /// Analysis/validation loop (empty member lists when a stage is absent)
    /// followed by one retry loop per stage.
    pub fn new(stages: &[StageSpec], retry_manager: &AgentId) -> Self {
        let members = |key: &str| {
            stages
                .iter()
                .find(|stage| stage.key == key)
                .map(StageSpec::specialist_ids)
                .unwrap_or_default()
        };

        let mut loops = vec![FeedbackLoop::CrossStage(CrossStageLoop {
            name: "analysis_validation_feedback".to_string(),
            sources: members(ANALYSIS_STAGE),
            targets: members(VALIDATION_STAGE),
            mode: "bidirectional".to_string(),
            criteria: vec![
                "evidence_threshold >= 0.8".to_string(),
                "no_conflicts_detected".to_string(),
            ],
        })];

        loops.extend(stages.iter().map(|stage| {
            FeedbackLoop::Retry(RetryLoop {
                name: format!("{}_retry_loop", stage.key),
                stage: stage.key.clone(),
                manager: retry_manager.clone(),
                trigger: "quality_board".to_string(),
                max_attempts: stage.retry.max_attempts,
            })
        }));

        Self { loops }
    }
}

// ============================================================================
// Parallel groups
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelGroup {
    pub name: String,
    pub members: Vec<AgentId>,
    pub concurrency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParallelGroups {
    #[serde(default)]
    pub groups: Vec<ParallelGroup>,
    #[serde(default)]
    pub supervisors: Vec<AgentId>,
}

impl ParallelGroups {
    pub fn new(stages: &[StageSpec], global_agents: &[AgentBlueprint]) -> Self {
        Self {
            groups: stages
                .iter()
                .map(|stage| ParallelGroup {
                    name: format!("{}_parallel", stage.key),
                    members: stage.specialist_ids(),
                    concurrency: stage.concurrency,
                })
                .collect(),
            supervisors: global_agents.iter().map(|a| a.identifier.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_flow_parses_minimal_yaml() {
        let yaml = r#"
stages:
  - key: search
    agents: [search.scholar, search.web]
    coordinator: search.coordinator
global_agents: [orchestration.supervisor]
"#;
        let flow: PipelineFlow = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(flow.stages[0].agents.len(), 2);
        assert_eq!(flow.stages[0].coordinator.as_ref().map(AgentId::as_str), Some("search.coordinator"));
        assert!(flow.edges.is_empty());
    }

    #[test]
    fn test_feedback_loop_variants_roundtrip() {
        let yaml = r#"
loops:
  - name: analysis_validation_feedback
    sources: []
    targets: []
    mode: bidirectional
    criteria: [no_conflicts_detected]
  - name: search_retry_loop
    stage: search
    manager: orchestration.retry_manager
    trigger: quality_board
    max_attempts: 3
"#;
        let loops: FeedbackLoops = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(loops.loops[0], FeedbackLoop::CrossStage(_)));
        assert!(matches!(&loops.loops[1], FeedbackLoop::Retry(r) if r.max_attempts == 3));
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bundle Checks
//!
//! Declarative regression assertions written under `tests/` in every bundle
//! and evaluated by the bundle verifier.

use serde::{Deserialize, Serialize};

pub const PIPELINE_E2E_SUITE: &str = "tests/pipeline_e2e.yaml";
pub const PARALLEL_AGENTS_SUITE: &str = "tests/parallel_agents.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum BundleCheck {
    MinAgentCount { min: usize },
    MinEdgeCount { min: usize },
    PolicySummaryNonEmpty,
    PipelineHasStages,
    ParallelGroupsNonEmpty,
    /// Every parallel group holds at least `min` members.
    MinParallelGroupMembers { min: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSuite {
    pub name: String,
    pub checks: Vec<BundleCheck>,
}

impl CheckSuite {
    pub fn pipeline_e2e() -> Self {
        Self {
            name: "pipeline_e2e".to_string(),
            checks: vec![
                BundleCheck::MinAgentCount { min: 20 },
                BundleCheck::MinEdgeCount { min: 80 },
                BundleCheck::PolicySummaryNonEmpty,
                BundleCheck::PipelineHasStages,
                BundleCheck::ParallelGroupsNonEmpty,
            ],
        }
    }

    pub fn parallel_agents() -> Self {
        Self {
            name: "parallel_agents".to_string(),
            checks: vec![BundleCheck::MinParallelGroupMembers { min: 3 }],
        }
    }
}

/// Counts a bundle exposes to its checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleFacts {
    pub agent_count: usize,
    pub edge_count: usize,
    pub policy_count: usize,
    pub stage_count: usize,
    /// `(group name, member count)` in file order.
    pub parallel_groups: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub detail: String,
}

impl BundleCheck {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MinAgentCount { .. } => "min_agent_count",
            Self::MinEdgeCount { .. } => "min_edge_count",
            Self::PolicySummaryNonEmpty => "policy_summary_non_empty",
            Self::PipelineHasStages => "pipeline_has_stages",
            Self::ParallelGroupsNonEmpty => "parallel_groups_non_empty",
            Self::MinParallelGroupMembers { .. } => "min_parallel_group_members",
        }
    }

    pub fn evaluate(&self, facts: &BundleFacts) -> CheckOutcome {
        match self {
            Self::MinAgentCount { min } => threshold("agents", facts.agent_count, *min),
            Self::MinEdgeCount { min } => threshold("edges", facts.edge_count, *min),
            Self::PolicySummaryNonEmpty => threshold("policy keys", facts.policy_count, 1),
            Self::PipelineHasStages => threshold("stages", facts.stage_count, 1),
            Self::ParallelGroupsNonEmpty => {
                threshold("parallel groups", facts.parallel_groups.len(), 1)
            }
            Self::MinParallelGroupMembers { min } => {
                let short: Vec<String> = facts
                    .parallel_groups
                    .iter()
                    .filter(|(_, members)| members < min)
                    .map(|(name, members)| format!("{} ({})", name, members))
                    .collect();
                if short.is_empty() {
                    CheckOutcome {
                        passed: true,
                        detail: format!("all groups have >= {} members", min),
                    }
                } else {
                    CheckOutcome {
                        passed: false,
                        detail: format!("groups below {} members: {}", min, short.join(", ")),
                    }
                }
            }
        }
    }
}

fn threshold(what: &str, actual: usize, min: usize) -> CheckOutcome {
    CheckOutcome {
        passed: actual >= min,
        detail: format!("{} {} (min {})", actual, what, min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_yaml_shape() {
        let yaml = serde_yaml::to_string(&CheckSuite::parallel_agents()).unwrap();
        assert!(yaml.contains("check: min_parallel_group_members"));
        assert!(yaml.contains("min: 3"));
        let parsed: CheckSuite = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, CheckSuite::parallel_agents());
    }

    #[test]
    fn test_parallel_member_check() {
        let facts = BundleFacts {
            parallel_groups: vec![("search_parallel".into(), 3), ("reporting_parallel".into(), 2)],
            ..Default::default()
        };
        let outcome = BundleCheck::MinParallelGroupMembers { min: 3 }.evaluate(&facts);
        assert!(!outcome.passed);
        assert!(outcome.detail.contains("reporting_parallel (2)"));
    }

    #[test]
    fn test_threshold_checks() {
        let facts = BundleFacts {
            agent_count: 28,
            edge_count: 79,
            ..Default::default()
        };
        assert!(BundleCheck::MinAgentCount { min: 20 }.evaluate(&facts).passed);
        assert!(!BundleCheck::MinEdgeCount { min: 80 }.evaluate(&facts).passed);
        assert!(!BundleCheck::PolicySummaryNonEmpty.evaluate(&facts).passed);
    }
}

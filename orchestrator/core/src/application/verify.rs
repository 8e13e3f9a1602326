// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bundle Verifier
//!
//! Evaluates the declarative check suites under a bundle's `tests/`
//! directory against the bundle's own manifest and flow descriptors.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Collaborators:** BundleReader (documents), BundleCheck (rules)

use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::domain::checks::{BundleFacts, CheckSuite, PARALLEL_AGENTS_SUITE, PIPELINE_E2E_SUITE};
use crate::infrastructure::bundle_reader::{BundleReadError, BundleReader};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub suite: String,
    pub check: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub results: Vec<CheckResult>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

pub struct BundleVerifier;

impl BundleVerifier {
    pub fn verify(root: impl AsRef<Path>) -> Result<VerificationReport, BundleReadError> {
        let root = root.as_ref();
        let bundle = BundleReader::open(root)?;
        let parallel_groups = BundleReader::parallel_groups(root)?.unwrap_or_default();

        let facts = BundleFacts {
            agent_count: bundle.manifest.nodes.len(),
            edge_count: bundle.manifest.edges.len(),
            policy_count: bundle.manifest.policy_summary.len(),
            stage_count: bundle.pipeline.stages.len(),
            parallel_groups: parallel_groups
                .groups
                .iter()
                .map(|group| (group.name.clone(), group.members.len()))
                .collect(),
        };
        debug!(?facts, "Collected bundle facts");

        let mut report = VerificationReport::default();
        for relative in [PIPELINE_E2E_SUITE, PARALLEL_AGENTS_SUITE] {
            let Some(suite) = BundleReader::yaml_document::<CheckSuite>(root, relative)? else {
                warn!(suite = relative, "Check suite missing from bundle");
                continue;
            };
            for check in &suite.checks {
                let outcome = check.evaluate(&facts);
                report.results.push(CheckResult {
                    suite: suite.name.clone(),
                    check: check.name().to_string(),
                    passed: outcome.passed,
                    detail: outcome.detail,
                });
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::build_orchestration::build_orchestration;
    use serde_json::json;

    #[test]
    fn test_small_bundle_fails_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_orchestration(
            json!({"name": "Small", "pipeline_stages": [{"key": "s", "agents": ["A", "B"]}]}),
            dir.path(),
            None,
        )
        .unwrap();

        let report = BundleVerifier::verify(result.bundle_root().unwrap()).unwrap();
        assert_eq!(report.results.len(), 6);
        assert!(!report.passed());
        let failed: Vec<&str> = report.failures().map(|r| r.check.as_str()).collect();
        assert_eq!(
            failed,
            vec!["min_agent_count", "min_edge_count", "min_parallel_group_members"]
        );
    }

    #[test]
    fn test_missing_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let err = BundleVerifier::verify(dir.path()).unwrap_err();
        assert_eq!(err.kind(), "BundleNotFound");
    }
}

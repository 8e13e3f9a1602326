// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Audit Trail
//!
//! One entry per LLM invocation, serialized as a single manifest at
//! `audit/orchestration_run.json`. Entries are append-only and appear in
//! execution order.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Audit entry and run manifest documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identifiers::AgentId;
use crate::domain::policy::PolicyDecisionRecord;

pub const AUDIT_DIR: &str = "audit";
pub const AUDIT_FILE: &str = "orchestration_run.json";
pub const OUTPUTS_DIR: &str = "outputs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub agent_id: AgentId,
    pub stage: String,
    /// Bundle-relative prompt path.
    pub prompt_file: String,
    /// Upstream agents whose outputs were folded into the context.
    pub dependencies: Vec<AgentId>,
    /// Full `depends_on` list from the agent spec.
    pub declared_dependencies: Vec<AgentId>,
    /// Bundle-relative output path (`outputs/...`).
    pub output_file: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: f64,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    MaxAgents,
    PolicyTruncated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditManifest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub output_count: usize,
    pub stop_reason: StopReason,
    pub entries: Vec<AuditEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_decisions: Vec<PolicyDecisionRecord>,
}

impl AuditManifest {
    pub fn new(
        run_id: Uuid,
        model: impl Into<String>,
        output_count: usize,
        stop_reason: StopReason,
        entries: Vec<AuditEntry>,
        policy_decisions: Vec<PolicyDecisionRecord>,
    ) -> Self {
        Self {
            run_id,
            generated_at: Utc::now(),
            model: model.into(),
            output_count,
            stop_reason,
            entries,
            policy_decisions,
        }
    }

    pub fn executed_ids(&self) -> impl Iterator<Item = &AgentId> {
        self.entries.iter().map(|entry| &entry.agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_manifest_serialization() {
        let manifest = AuditManifest::new(
            Uuid::new_v4(),
            "gemini-2.0-flash-exp",
            0,
            StopReason::MaxAgents,
            vec![],
            vec![],
        );
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["output_count"], 0);
        assert_eq!(json["stop_reason"], "max_agents");
        assert!(json["entries"].as_array().unwrap().is_empty());
        assert!(json.get("policy_decisions").is_none());
    }
}

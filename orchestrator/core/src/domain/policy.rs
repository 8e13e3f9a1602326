// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Governance Policies
//!
//! Policy tokens attached to blueprints, the governance snapshot written to
//! `policies/research_governance.json`, and the runtime enforcer that turns
//! that snapshot into allow / truncate / escalate / deny decisions.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Policy derivation and runtime policy gates
//!
//! # Check order
//!
//! The enforcer evaluates, first match wins:
//!
//! 1. research depth above the limit -> `Deny`
//! 2. remaining orchestration budget below the per-agent latency budget -> `Truncate`
//! 3. evidence score below threshold -> `Escalate`
//! 4. uncertainty above the κ threshold -> `Escalate`
//! 5. projected cost above the cost limit -> `Deny`
//!
//! Otherwise `Allow`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::identifiers::{dedupe, slugify, AgentId};

pub const POLICY_SNAPSHOT_FILE: &str = "policies/research_governance.json";

pub const RESEARCH_DEPTH: &str = "policy.research_depth";
pub const EVIDENCE_THRESHOLD: &str = "policy.evidence_threshold";
pub const LATENCY_BUDGET: &str = "policy.latency_budget";
pub const STAGE_ALIGNMENT: &str = "policy.stage_alignment";
pub const SYSTEM_OBSERVABILITY: &str = "policy.system_observability";
pub const SYSTEM_FALLBACKS: &str = "policy.system_fallbacks";

const MAX_RESEARCH_DEPTH_KEY: &str = "max_research_depth";
const EVIDENCE_THRESHOLD_KEY: &str = "evidence_threshold";
const MAX_TOTAL_TIME_KEY: &str = "max_total_time";

/// Sorted, deduplicated tokens every blueprint inherits: the three fixed
/// tokens plus `policy.seed.<slug>` per seed policy key.
pub fn base_policy_tokens(seed_policies: &BTreeMap<String, Value>) -> Vec<String> {
    let mut tokens: Vec<String> = [RESEARCH_DEPTH, EVIDENCE_THRESHOLD, LATENCY_BUDGET]
        .iter()
        .map(|t| t.to_string())
        .chain(
            seed_policies
                .keys()
                .map(|key| format!("policy.seed.{}", slugify(key))),
        )
        .collect();
    tokens.sort();
    dedupe(tokens)
}

// ============================================================================
// Snapshot
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePolicies {
    pub max_research_depth: Value,
    pub evidence_threshold: Value,
    pub max_total_time_minutes: Value,
}

/// Governance snapshot derived from the seed `policies` mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub base: BasePolicies,
    #[serde(default)]
    pub stage_overrides: BTreeMap<String, Value>,
}

impl PolicySnapshot {
    pub fn from_seed(seed_policies: &BTreeMap<String, Value>) -> Self {
        let pick = |key: &str, fallback: Value| seed_policies.get(key).cloned().unwrap_or(fallback);

        Self {
            base: BasePolicies {
                max_research_depth: pick(MAX_RESEARCH_DEPTH_KEY, Value::from(3)),
                evidence_threshold: pick(EVIDENCE_THRESHOLD_KEY, Value::from(0.8)),
                max_total_time_minutes: pick(MAX_TOTAL_TIME_KEY, Value::from(60)),
            },
            stage_overrides: seed_policies
                .iter()
                .filter(|(key, _)| {
                    ![MAX_RESEARCH_DEPTH_KEY, EVIDENCE_THRESHOLD_KEY, MAX_TOTAL_TIME_KEY]
                        .contains(&key.as_str())
                })
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Whole-run time budget, from `max_total_time_minutes`.
    pub fn orchestration_budget(&self) -> Duration {
        let minutes = numeric(&self.base.max_total_time_minutes).unwrap_or(60.0).max(0.0);
        saturating_secs(minutes * 60.0)
    }

    fn override_value(&self, key: &str) -> Option<f64> {
        self.stage_overrides.get(key).and_then(numeric)
    }
}

/// Seed scalars may arrive as numbers or numeric strings. NaN reads as absent.
fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|v: &f64| !v.is_nan())
}

/// Non-negative seconds to a `Duration`; infinite or oversized values clamp to `Duration::MAX`.
fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 { Duration::MAX } else { Duration::ZERO })
}

// ============================================================================
// Enforcer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyDecision {
    Allow,
    Truncate,
    Escalate,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvidenceScores {
    pub coverage: f64,
    pub credibility: f64,
    pub consistency: f64,
}

impl EvidenceScores {
    pub fn overall(&self) -> f64 {
        self.coverage * 0.4 + self.credibility * 0.4 + self.consistency * 0.2
    }
}

/// Run-level state the enforcer compares budgets against.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeState {
    pub budget: Duration,
    pub elapsed: Duration,
    pub agents_executed: u32,
    pub total_cost_usd: f64,
}

impl RuntimeState {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            elapsed: Duration::ZERO,
            agents_executed: 0,
            total_cost_usd: 0.0,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.budget.as_secs_f64() - self.elapsed.as_secs_f64()
    }
}

/// Per-agent facts evaluated before execution.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardRequest {
    pub agent_id: AgentId,
    pub stage: String,
    pub depth: u32,
    pub evidence: Option<EvidenceScores>,
    pub uncertainty: f64,
    pub estimated_cost: f64,
}

impl GuardRequest {
    pub fn new(agent_id: AgentId, stage: impl Into<String>, depth: u32) -> Self {
        Self {
            agent_id,
            stage: stage.into(),
            depth,
            evidence: None,
            uncertainty: 0.0,
            estimated_cost: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PolicyViolations {
    pub latency_exceeded: bool,
    pub depth_exceeded: bool,
    pub uncertainty_too_high: bool,
    pub cost_exceeded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEnforcementDecision {
    pub decision: PolicyDecision,
    pub reason: String,
    pub evidence_score: f64,
    pub violations: PolicyViolations,
}

impl PolicyEnforcementDecision {
    pub fn allowed(&self) -> bool {
        self.decision == PolicyDecision::Allow
    }

    pub fn record(&self, agent_id: &AgentId, stage: &str) -> PolicyDecisionRecord {
        PolicyDecisionRecord {
            timestamp: Utc::now(),
            agent_id: agent_id.clone(),
            stage: stage.to_string(),
            decision: self.decision,
            reason: self.reason.clone(),
            evidence_score: self.evidence_score,
            violations: self.violations,
        }
    }
}

/// Audit-trail form of a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    pub stage: String,
    pub decision: PolicyDecision,
    pub reason: String,
    pub evidence_score: f64,
    pub violations: PolicyViolations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyEnforcer {
    pub evidence_threshold: f64,
    pub latency_budget: Duration,
    pub max_research_depth: u32,
    pub kappa_threshold: f64,
    pub max_cost_usd: Option<f64>,
}

impl Default for PolicyEnforcer {
    fn default() -> Self {
        Self {
            evidence_threshold: 0.7,
            latency_budget: Duration::from_secs(30),
            max_research_depth: 3,
            kappa_threshold: 0.2,
            max_cost_usd: None,
        }
    }
}

impl PolicyEnforcer {
    /// Thresholds from the snapshot's base section; optional
    /// `latency_budget_seconds`, `kappa_threshold` and `max_cost_usd` are
    /// read from the overrides.
    pub fn from_snapshot(snapshot: &PolicySnapshot) -> Self {
        let defaults = Self::default();
        Self {
            evidence_threshold: numeric(&snapshot.base.evidence_threshold)
                .unwrap_or(defaults.evidence_threshold),
            latency_budget: snapshot
                .override_value("latency_budget_seconds")
                .filter(|secs| *secs >= 0.0)
                .map(saturating_secs)
                .unwrap_or(defaults.latency_budget),
            max_research_depth: numeric(&snapshot.base.max_research_depth)
                .filter(|depth| *depth >= 0.0)
                .map(|depth| depth as u32)
                .unwrap_or(defaults.max_research_depth),
            kappa_threshold: snapshot
                .override_value("kappa_threshold")
                .unwrap_or(defaults.kappa_threshold),
            max_cost_usd: snapshot.override_value("max_cost_usd"),
        }
    }

    pub fn guard(&self, state: &RuntimeState, request: &GuardRequest) -> PolicyEnforcementDecision {
        let evidence_score = request.evidence.map(|e| e.overall());
        let scored = evidence_score.unwrap_or(0.0);

        if request.depth > self.max_research_depth {
            return Self::decide(
                PolicyDecision::Deny,
                format!(
                    "Research depth {} exceeds limit {}",
                    request.depth, self.max_research_depth
                ),
                scored,
                PolicyViolations {
                    depth_exceeded: true,
                    ..Default::default()
                },
            );
        }

        let remaining = state.remaining();
        let needed = self.latency_budget.as_secs_f64();
        if remaining < needed {
            return Self::decide(
                PolicyDecision::Truncate,
                format!(
                    "Orchestration budget nearly exhausted: {:.1}s remaining, agent needs {:.1}s",
                    remaining, needed
                ),
                scored,
                PolicyViolations {
                    latency_exceeded: true,
                    ..Default::default()
                },
            );
        }

        if let Some(score) = evidence_score {
            if score < self.evidence_threshold {
                return Self::decide(
                    PolicyDecision::Escalate,
                    format!(
                        "Evidence score {:.2} below threshold {:.2}",
                        score, self.evidence_threshold
                    ),
                    score,
                    PolicyViolations::default(),
                );
            }
        }

        if request.uncertainty > self.kappa_threshold {
            return Self::decide(
                PolicyDecision::Escalate,
                format!(
                    "Uncertainty {:.2} exceeds κ threshold {:.2}",
                    request.uncertainty, self.kappa_threshold
                ),
                scored,
                PolicyViolations {
                    uncertainty_too_high: true,
                    ..Default::default()
                },
            );
        }

        if let Some(limit) = self.max_cost_usd {
            let projected = state.total_cost_usd + request.estimated_cost;
            if projected > limit {
                return Self::decide(
                    PolicyDecision::Deny,
                    format!("Cost limit would be exceeded: {:.4} > {:.4}", projected, limit),
                    scored,
                    PolicyViolations {
                        cost_exceeded: true,
                        ..Default::default()
                    },
                );
            }
        }

        Self::decide(
            PolicyDecision::Allow,
            "All policy constraints satisfied".to_string(),
            evidence_score.unwrap_or(1.0),
            PolicyViolations::default(),
        )
    }

    fn decide(
        decision: PolicyDecision,
        reason: String,
        evidence_score: f64,
        violations: PolicyViolations,
    ) -> PolicyEnforcementDecision {
        PolicyEnforcementDecision {
            decision,
            reason,
            evidence_score,
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> RuntimeState {
        RuntimeState::new(Duration::from_secs(900))
    }

    fn request(depth: u32) -> GuardRequest {
        GuardRequest::new(AgentId::new("test.agent").unwrap(), "test", depth)
    }

    #[test]
    fn test_base_policy_tokens() {
        let mut seed = BTreeMap::new();
        seed.insert("Max Research Depth".to_string(), json!(3));
        seed.insert("custom".to_string(), json!("x"));
        assert_eq!(
            base_policy_tokens(&seed),
            vec![
                "policy.evidence_threshold",
                "policy.latency_budget",
                "policy.research_depth",
                "policy.seed.custom",
                "policy.seed.max_research_depth",
            ]
        );
    }

    #[test]
    fn test_snapshot_split() {
        let mut seed = BTreeMap::new();
        seed.insert("max_total_time".to_string(), json!(15));
        seed.insert("citation_style".to_string(), json!("apa"));
        let snapshot = PolicySnapshot::from_seed(&seed);
        assert_eq!(snapshot.base.max_research_depth, json!(3));
        assert_eq!(snapshot.base.max_total_time_minutes, json!(15));
        assert_eq!(snapshot.stage_overrides.len(), 1);
        assert_eq!(snapshot.orchestration_budget(), Duration::from_secs(900));
    }

    #[test]
    fn test_allow_when_all_constraints_hold() {
        let decision = PolicyEnforcer::default().guard(&state(), &request(1));
        assert!(decision.allowed());
        assert_eq!(decision.evidence_score, 1.0);
    }

    #[test]
    fn test_depth_checked_before_budget() {
        let mut exhausted = state();
        exhausted.elapsed = Duration::from_secs(899);
        let decision = PolicyEnforcer::default().guard(&exhausted, &request(4));
        assert_eq!(decision.decision, PolicyDecision::Deny);
        assert!(decision.violations.depth_exceeded);

        let decision = PolicyEnforcer::default().guard(&exhausted, &request(1));
        assert_eq!(decision.decision, PolicyDecision::Truncate);
        assert!(decision.violations.latency_exceeded);
    }

    #[test]
    fn test_escalations() {
        let mut weak = request(1);
        weak.evidence = Some(EvidenceScores {
            coverage: 0.5,
            credibility: 0.5,
            consistency: 0.5,
        });
        weak.uncertainty = 0.9;
        let decision = PolicyEnforcer::default().guard(&state(), &weak);
        assert_eq!(decision.decision, PolicyDecision::Escalate);
        assert!(!decision.violations.uncertainty_too_high);

        let mut unsure = request(1);
        unsure.uncertainty = 0.5;
        let decision = PolicyEnforcer::default().guard(&state(), &unsure);
        assert_eq!(decision.decision, PolicyDecision::Escalate);
        assert!(decision.violations.uncertainty_too_high);
    }

    #[test]
    fn test_cost_limit_denies() {
        let enforcer = PolicyEnforcer {
            max_cost_usd: Some(1.0),
            ..Default::default()
        };
        let mut spent = state();
        spent.total_cost_usd = 0.9;
        let mut costly = request(1);
        costly.estimated_cost = 0.2;
        let decision = enforcer.guard(&spent, &costly);
        assert_eq!(decision.decision, PolicyDecision::Deny);
        assert!(decision.violations.cost_exceeded);
    }

    #[test]
    fn test_enforcer_from_snapshot() {
        let mut seed = BTreeMap::new();
        seed.insert("max_research_depth".to_string(), json!(2));
        seed.insert("evidence_threshold".to_string(), json!("0.9"));
        seed.insert("latency_budget_seconds".to_string(), json!(5));
        let enforcer = PolicyEnforcer::from_snapshot(&PolicySnapshot::from_seed(&seed));
        assert_eq!(enforcer.max_research_depth, 2);
        assert_eq!(enforcer.evidence_threshold, 0.9);
        assert_eq!(enforcer.latency_budget, Duration::from_secs(5));
        assert_eq!(enforcer.max_cost_usd, None);
    }

    #[test]
    fn test_out_of_range_durations_saturate() {
        let mut seed = BTreeMap::new();
        seed.insert("max_total_time".to_string(), json!("inf"));
        seed.insert("latency_budget_seconds".to_string(), json!(1e30));
        let snapshot = PolicySnapshot::from_seed(&seed);
        assert_eq!(snapshot.orchestration_budget(), Duration::MAX);
        assert_eq!(PolicyEnforcer::from_snapshot(&snapshot).latency_budget, Duration::MAX);

        seed.insert("max_total_time".to_string(), json!(1e300));
        assert_eq!(PolicySnapshot::from_seed(&seed).orchestration_budget(), Duration::MAX);

        seed.insert("max_total_time".to_string(), json!("NaN"));
        seed.insert("latency_budget_seconds".to_string(), json!("NaN"));
        let snapshot = PolicySnapshot::from_seed(&seed);
        assert_eq!(snapshot.orchestration_budget(), Duration::from_secs(3600));
        assert_eq!(
            PolicyEnforcer::from_snapshot(&snapshot).latency_budget,
            Duration::from_secs(30)
        );

        seed.insert("max_total_time".to_string(), json!(-5));
        assert_eq!(PolicySnapshot::from_seed(&seed).orchestration_budget(), Duration::ZERO);
    }
}

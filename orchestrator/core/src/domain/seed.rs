// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Seed Domain Model
//!
//! A seed is the declarative input the compiler expands into an orchestration.
//! Two shapes exist:
//!
//! - **Flat**: a top-level `agents` list with explicit `depends_on` edges.
//!   Produces a single manifest and nothing else.
//! - **Pipeline**: `pipeline_stages` present. Produces a full artifact bundle.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Typed seed representation and structural validation
//!
//! # Example
//!
//! ```yaml
//! name: Research Orchestrator
//! policies:
//!   max_research_depth: 3
//! pipeline_stages:
//!   - key: search
//!     label: Literature Search
//!     agents:
//!       - Scholar Agent
//!       - name: Web Agent
//!         role: retriever
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};

use crate::domain::blueprint::RetryPolicy;

// ============================================================================
// Scalar coercion
// ============================================================================

/// Any YAML/JSON scalar rendered as text (`3` -> `"3"`, `null` -> `""`).
///
/// Seeds are hand-written; ids and labels are frequently unquoted numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalarText(pub String);

impl ScalarText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trimmed text, `None` when blank.
    pub fn non_blank(&self) -> Option<&str> {
        let trimmed = self.0.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(Self(s)),
            serde_json::Value::Number(n) => Ok(Self(n.to_string())),
            serde_json::Value::Bool(b) => Ok(Self(b.to_string())),
            serde_json::Value::Null => Ok(Self::default()),
            other => Err(D::Error::custom(format!(
                "expected a scalar value, found {}",
                value_kind(&other)
            ))),
        }
    }
}

pub(crate) fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "sequence",
        serde_json::Value::Object(_) => "mapping",
    }
}

/// First non-blank value among the candidates.
pub(crate) fn first_non_blank<'a>(candidates: &[&'a Option<ScalarText>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|candidate| candidate.as_ref().and_then(ScalarText::non_blank))
        .next()
}

// ============================================================================
// Seed
// ============================================================================

#[derive(Debug, Clone)]
pub enum Seed {
    Flat(FlatSeed),
    Pipeline(PipelineSeed),
}

// ============================================================================
// Flat shape
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlatSeed {
    #[serde(default, deserialize_with = "null_as_default")]
    pub agents: Vec<FlatAgentEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlatAgentEntry {
    #[serde(default)]
    pub id: ScalarText,
    #[serde(default)]
    pub role: Option<ScalarText>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub policy_pack_ids: Vec<ScalarText>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub depends_on: Vec<ScalarText>,
    #[serde(default)]
    pub relation: Option<ScalarText>,
    #[serde(default)]
    pub max_dependency_degree: Option<u32>,
}

impl FlatSeed {
    /// Reject empty or duplicate ids, self dependencies and dangling
    /// `depends_on` references.
    pub fn validate(&self) -> Result<(), SeedError> {
        let mut ids = HashSet::new();
        for (index, agent) in self.agents.iter().enumerate() {
            let id = agent.id.non_blank().ok_or_else(|| {
                SeedError::Invalid(format!("agent entry #{} is missing 'id'", index + 1))
            })?;
            if !ids.insert(id) {
                return Err(SeedError::Invalid(format!("duplicate agent id: {}", id)));
            }
        }

        for agent in &self.agents {
            let source = agent.id.as_str().trim();
            for target in agent.depends_on.iter().filter_map(ScalarText::non_blank) {
                if target == source {
                    return Err(SeedError::Invalid(format!(
                        "agent {} depends on itself",
                        source
                    )));
                }
                if !ids.contains(target) {
                    return Err(SeedError::Invalid(format!(
                        "agent {} depends on unknown agent {}",
                        source, target
                    )));
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Pipeline shape
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineSeed {
    #[serde(default)]
    pub name: Option<ScalarText>,

    #[serde(default)]
    pub description: Option<ScalarText>,

    /// Seed-level policy knobs (name -> scalar). Sorted for deterministic output.
    #[serde(default, deserialize_with = "null_as_default")]
    pub policies: BTreeMap<String, serde_json::Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub pipeline_stages: Vec<StageEntry>,

    /// Extra global agents; non-mapping entries are dropped by the loader.
    #[serde(default, deserialize_with = "null_as_default")]
    pub global_agents: Vec<GlobalAgentEntry>,
}

impl PipelineSeed {
    pub const DEFAULT_NAME: &'static str = "ResearchOrchestrator";

    pub fn display_name(&self) -> &str {
        first_non_blank(&[&self.name]).unwrap_or(Self::DEFAULT_NAME)
    }

    pub fn description_text(&self) -> &str {
        self.description
            .as_ref()
            .map(|d| d.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageEntry {
    #[serde(default)]
    pub key: Option<ScalarText>,
    #[serde(default)]
    pub label: Option<ScalarText>,
    #[serde(default)]
    pub name: Option<ScalarText>,
    /// 0 and absent both mean "one slot per agent".
    #[serde(default)]
    pub concurrency: Option<u32>,
    #[serde(default)]
    pub retry: Option<RetrySeed>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub agents: Vec<AgentEntry>,
}

/// A stage agent: either a bare label or a detailed mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AgentEntry {
    Label(ScalarText),
    Detailed(AgentDetails),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentDetails {
    #[serde(default)]
    pub label: Option<ScalarText>,
    #[serde(default)]
    pub name: Option<ScalarText>,
    #[serde(default)]
    pub id: Option<ScalarText>,
    #[serde(default)]
    pub role: Option<ScalarText>,
    #[serde(default)]
    pub description: Option<ScalarText>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: Vec<ScalarText>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub policies: Vec<ScalarText>,
    #[serde(default)]
    pub concurrency: Option<u32>,
    #[serde(default)]
    pub retry: Option<RetrySeed>,
}

/// Partial retry mapping; missing fields fall back to the enclosing default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrySeed {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub cooldown_seconds: Option<u64>,
}

impl RetrySeed {
    pub fn resolve(&self, fallback: &RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(fallback.max_attempts),
            strategy: self
                .strategy
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| fallback.strategy.clone()),
            cooldown_seconds: self.cooldown_seconds.unwrap_or(fallback.cooldown_seconds),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalAgentEntry {
    #[serde(default)]
    pub identifier: Option<ScalarText>,
    #[serde(default)]
    pub id: Option<ScalarText>,
    #[serde(default)]
    pub name: Option<ScalarText>,
    #[serde(default)]
    pub role: Option<ScalarText>,
    #[serde(default)]
    pub description: Option<ScalarText>,
    #[serde(default)]
    pub category: Option<ScalarText>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Errors
// ============================================================================

/// Structural seed defects. Every variant reports as `InvalidSeed`.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("IO error reading seed {path}: {error}")]
    Io { path: String, error: String },

    #[error("Seed parse error: {0}")]
    Parse(String),

    #[error("Invalid seed: {0}")]
    Invalid(String),
}

impl SeedError {
    pub fn kind(&self) -> &'static str {
        "InvalidSeed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(value: serde_json::Value) -> FlatSeed {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_scalar_text_coercion() {
        let entry: FlatAgentEntry = serde_json::from_value(json!({"id": 42})).unwrap();
        assert_eq!(entry.id.as_str(), "42");

        let err = serde_json::from_value::<FlatAgentEntry>(json!({"id": {"nested": true}}));
        assert!(err.is_err());
    }

    #[test]
    fn test_flat_validation_accepts_valid_graph() {
        let seed = flat(json!({
            "agents": [
                {"id": "a", "depends_on": ["b"]},
                {"id": "b", "depends_on": []}
            ]
        }));
        assert!(seed.validate().is_ok());
    }

    #[test]
    fn test_flat_validation_rejects_dangling_dependency() {
        let seed = flat(json!({"agents": [{"id": "a", "depends_on": ["nonexistent"]}]}));
        assert!(matches!(seed.validate(), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_flat_validation_rejects_duplicates_and_empty_ids() {
        let seed = flat(json!({"agents": [{"id": "a"}, {"id": " a "}]}));
        assert!(seed.validate().is_err());

        let seed = flat(json!({"agents": [{"role": "orphan"}]}));
        assert!(seed.validate().is_err());
    }

    #[test]
    fn test_flat_validation_rejects_self_dependency() {
        let seed = flat(json!({"agents": [{"id": "a", "depends_on": ["a"]}]}));
        assert!(seed.validate().is_err());
    }

    #[test]
    fn test_agent_entry_shapes() {
        let stage: StageEntry = serde_json::from_value(json!({
            "key": "search",
            "agents": ["Scholar Agent", {"name": "Web Agent", "role": "retriever"}, 7]
        }))
        .unwrap();

        assert!(matches!(&stage.agents[0], AgentEntry::Label(l) if l.as_str() == "Scholar Agent"));
        assert!(matches!(&stage.agents[1], AgentEntry::Detailed(d) if d.role.as_ref().unwrap().as_str() == "retriever"));
        assert!(matches!(&stage.agents[2], AgentEntry::Label(l) if l.as_str() == "7"));
    }

    #[test]
    fn test_retry_seed_resolution() {
        let partial = RetrySeed {
            max_attempts: Some(2),
            ..Default::default()
        };
        let resolved = partial.resolve(&RetryPolicy::stage_default());
        assert_eq!(resolved.max_attempts, 2);
        assert_eq!(resolved.strategy, "exponential");
        assert_eq!(resolved.cooldown_seconds, 15);
    }

    #[test]
    fn test_null_sections_default() {
        let seed: PipelineSeed = serde_json::from_value(json!({
            "name": "x",
            "policies": null,
            "pipeline_stages": null
        }))
        .unwrap();
        assert!(seed.policies.is_empty());
        assert!(seed.pipeline_stages.is_empty());
    }
}

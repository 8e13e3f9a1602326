// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Seed Loader
//!
//! Parses orchestration seeds from YAML or JSON into the typed seed model.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external YAML/JSON → Domain objects
//! - **Anti-Corruption:** Structural checks with precise messages before the
//!   typed conversion, so a defect names the stage or agent it sits in
//!
//! # Routing
//!
//! A root mapping containing `pipeline_stages` is a pipeline seed; any other
//! mapping is a flat seed. Anything that is not a mapping is rejected.
//!
//! # Extension handling
//!
//! `.yml` / `.yaml` parse as YAML, every other extension as JSON.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::domain::seed::{value_kind, FlatSeed, PipelineSeed, Seed, SeedError};

/// Where a seed comes from.
#[derive(Debug, Clone)]
pub enum SeedSource {
    Path(PathBuf),
    Value(Value),
}

impl From<PathBuf> for SeedSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for SeedSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Value> for SeedSource {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Seed loader (Infrastructure service)
pub struct SeedLoader;

impl SeedLoader {
    pub fn load(source: impl Into<SeedSource>) -> Result<Seed, SeedError> {
        match source.into() {
            SeedSource::Path(path) => Self::parse_file(path),
            SeedSource::Value(value) => Self::from_value(value),
        }
    }

    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Seed, SeedError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SeedError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        if is_yaml(path) {
            Self::parse_yaml(&content)
        } else {
            Self::parse_json(&content)
        }
    }

    pub fn parse_yaml(yaml: &str) -> Result<Seed, SeedError> {
        let value: Value =
            serde_yaml::from_str(yaml).map_err(|e| SeedError::Parse(format!("YAML: {}", e)))?;
        Self::from_value(value)
    }

    pub fn parse_json(json: &str) -> Result<Seed, SeedError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| SeedError::Parse(format!("JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Seed, SeedError> {
        let mut root = match value {
            Value::Object(root) => root,
            other => {
                return Err(SeedError::Invalid(format!(
                    "seed root must be a mapping, found {}",
                    value_kind(&other)
                )))
            }
        };

        if root.contains_key("pipeline_stages") {
            Self::check_pipeline_shape(&root)?;
            if let Some(Value::Array(entries)) = root.get_mut("global_agents") {
                let before = entries.len();
                entries.retain(Value::is_object);
                if entries.len() != before {
                    warn!(
                        dropped = before - entries.len(),
                        "Ignoring global_agents entries that are not mappings"
                    );
                }
            }
            let seed: PipelineSeed = serde_json::from_value(Value::Object(root))
                .map_err(|e| SeedError::Invalid(e.to_string()))?;
            Ok(Seed::Pipeline(seed))
        } else {
            Self::check_flat_shape(&root)?;
            let seed: FlatSeed = serde_json::from_value(Value::Object(root))
                .map_err(|e| SeedError::Invalid(e.to_string()))?;
            seed.validate()?;
            Ok(Seed::Flat(seed))
        }
    }

    fn check_pipeline_shape(root: &serde_json::Map<String, Value>) -> Result<(), SeedError> {
        expect_mapping_or_null(root.get("policies"), "policies")?;
        expect_sequence_or_null(root.get("global_agents"), "global_agents")?;

        let stages = match root.get("pipeline_stages") {
            Some(Value::Array(stages)) => stages.as_slice(),
            Some(Value::Null) | None => &[],
            Some(other) => {
                return Err(SeedError::Invalid(format!(
                    "pipeline_stages must be a sequence, found {}",
                    value_kind(other)
                )))
            }
        };

        for (index, stage) in stages.iter().enumerate() {
            let Value::Object(stage) = stage else {
                return Err(SeedError::Invalid(format!(
                    "pipeline stage #{} must be a mapping, found {}",
                    index + 1,
                    value_kind(stage)
                )));
            };

            let context = format!("pipeline stage #{}", index + 1);
            expect_sequence_or_null(stage.get("agents"), &format!("{} agents", context))?;
            expect_mapping_or_null(stage.get("retry"), &format!("{} retry", context))?;

            if let Some(Value::Array(agents)) = stage.get("agents") {
                for (position, agent) in agents.iter().enumerate() {
                    if agent.is_array() {
                        return Err(SeedError::Invalid(format!(
                            "{} agent #{} must be a label or a mapping",
                            context,
                            position + 1
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn check_flat_shape(root: &serde_json::Map<String, Value>) -> Result<(), SeedError> {
        expect_sequence_or_null(root.get("agents"), "agents")?;
        if let Some(Value::Array(agents)) = root.get("agents") {
            for (index, agent) in agents.iter().enumerate() {
                if !agent.is_object() {
                    return Err(SeedError::Invalid(format!(
                        "agent entry #{} must be a mapping, found {}",
                        index + 1,
                        value_kind(agent)
                    )));
                }
            }
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "yml" | "yaml"))
        .unwrap_or(false)
}

fn expect_sequence_or_null(value: Option<&Value>, what: &str) -> Result<(), SeedError> {
    match value {
        None | Some(Value::Null) | Some(Value::Array(_)) => Ok(()),
        Some(other) => Err(SeedError::Invalid(format!(
            "{} must be a sequence, found {}",
            what,
            value_kind(other)
        ))),
    }
}

fn expect_mapping_or_null(value: Option<&Value>, what: &str) -> Result<(), SeedError> {
    match value {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(other) => Err(SeedError::Invalid(format!(
            "{} must be a mapping, found {}",
            what,
            value_kind(other)
        ))),
    }
}

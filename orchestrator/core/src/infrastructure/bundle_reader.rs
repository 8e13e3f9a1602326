// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bundle Reader
//!
//! Loads the parts of a bundle the executor and verifier consume: the
//! manifest, the pipeline descriptor and an index of every agent spec.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse bundle files back into domain documents
//! - **Integration:** Bundle tree → PipelineExecutor / BundleVerifier
//!
//! Specs are discovered by walking `agents/` for `*.acl` files in file-name
//! order, so the index does not depend on directory iteration order.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::agent_spec::{AgentSpec, AgentSpecDocument, SPEC_EXTENSION};
use crate::domain::identifiers::AgentId;
use crate::domain::manifest::{OrchestrationManifest, MANIFEST_FILE};
use crate::domain::pipeline::{ParallelGroups, PipelineFlow, PARALLEL_GROUPS_FILE, PIPELINE_FILE};
use crate::domain::policy::{PolicySnapshot, POLICY_SNAPSHOT_FILE};

pub const AGENTS_DIR: &str = "agents";

#[derive(Debug, Error)]
pub enum BundleReadError {
    #[error("Bundle not found: {0}")]
    NotFound(String),

    #[error("Invalid bundle: {0}")]
    Invalid(String),

    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },
}

impl BundleReadError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "BundleNotFound",
            Self::Invalid(_) => "InvalidBundle",
            Self::Io { .. } => "Io",
        }
    }
}

/// One indexed agent spec.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRecord {
    pub path: PathBuf,
    pub spec: AgentSpec,
}

#[derive(Debug, Clone)]
pub struct LoadedBundle {
    pub root: PathBuf,
    pub manifest: OrchestrationManifest,
    pub pipeline: PipelineFlow,
    pub specs: BTreeMap<AgentId, SpecRecord>,
}

impl LoadedBundle {
    pub fn spec(&self, id: &AgentId) -> Option<&SpecRecord> {
        self.specs.get(id)
    }
}

pub struct BundleReader;

impl BundleReader {
    pub fn open(root: impl AsRef<Path>) -> Result<LoadedBundle, BundleReadError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(BundleReadError::NotFound(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let manifest: OrchestrationManifest = read_required(root, MANIFEST_FILE, parse_json)?;
        let pipeline: PipelineFlow = read_required(root, PIPELINE_FILE, parse_yaml)?;
        let specs = Self::index_specs(root)?;

        debug!(
            root = %root.display(),
            nodes = manifest.nodes.len(),
            stages = pipeline.stages.len(),
            specs = specs.len(),
            "Loaded orchestration bundle"
        );

        Ok(LoadedBundle {
            root: root.to_path_buf(),
            manifest,
            pipeline,
            specs,
        })
    }

    pub fn index_specs(root: &Path) -> Result<BTreeMap<AgentId, SpecRecord>, BundleReadError> {
        let agents_dir = root.join(AGENTS_DIR);
        let mut specs = BTreeMap::new();
        if !agents_dir.is_dir() {
            warn!(path = %agents_dir.display(), "Bundle has no agents directory");
            return Ok(specs);
        }

        for entry in WalkDir::new(&agents_dir).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| BundleReadError::Io {
                path: agents_dir.display().to_string(),
                error: e.to_string(),
            })?;
            let path = entry.path();
            let is_spec = entry.file_type().is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(SPEC_EXTENSION);
            if !is_spec {
                continue;
            }

            let document: AgentSpecDocument = parse_yaml(path, &read_text(path)?)?;
            let id = document.agent.id.clone();
            if let Some(existing) = specs.get(&id) {
                return Err(BundleReadError::Invalid(format!(
                    "agent '{}' is specified twice ({} and {})",
                    id,
                    existing.path.display(),
                    path.display()
                )));
            }
            specs.insert(
                id,
                SpecRecord {
                    path: path.to_path_buf(),
                    spec: document.agent,
                },
            );
        }

        Ok(specs)
    }

    /// `None` when the bundle carries no policy snapshot.
    pub fn policy_snapshot(root: &Path) -> Result<Option<PolicySnapshot>, BundleReadError> {
        read_optional(root, POLICY_SNAPSHOT_FILE, parse_json)
    }

    pub fn parallel_groups(root: &Path) -> Result<Option<ParallelGroups>, BundleReadError> {
        read_optional(root, PARALLEL_GROUPS_FILE, parse_yaml)
    }

    /// Any YAML document under the bundle root.
    pub fn yaml_document<T: DeserializeOwned>(
        root: &Path,
        relative: &str,
    ) -> Result<Option<T>, BundleReadError> {
        read_optional(root, relative, parse_yaml)
    }
}

fn read_required<T>(
    root: &Path,
    relative: &str,
    parse: fn(&Path, &str) -> Result<T, BundleReadError>,
) -> Result<T, BundleReadError> {
    let path = root.join(relative);
    if !path.is_file() {
        return Err(BundleReadError::NotFound(format!(
            "{} is missing from {}",
            relative,
            root.display()
        )));
    }
    parse(&path, &read_text(&path)?)
}

fn read_optional<T>(
    root: &Path,
    relative: &str,
    parse: fn(&Path, &str) -> Result<T, BundleReadError>,
) -> Result<Option<T>, BundleReadError> {
    let path = root.join(relative);
    if !path.is_file() {
        return Ok(None);
    }
    parse(&path, &read_text(&path)?).map(Some)
}

fn read_text(path: &Path) -> Result<String, BundleReadError> {
    fs::read_to_string(path).map_err(|e| BundleReadError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

fn parse_json<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T, BundleReadError> {
    serde_json::from_str(text)
        .map_err(|e| BundleReadError::Invalid(format!("{}: {}", path.display(), e)))
}

fn parse_yaml<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T, BundleReadError> {
    serde_yaml::from_str(text)
        .map_err(|e| BundleReadError::Invalid(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::compiler::compile;
    use crate::infrastructure::bundle_writer::BundleWriter;
    use serde_json::json;

    fn write_bundle(dir: &Path) -> PathBuf {
        let seed = serde_json::from_value(json!({
            "name": "Reader Test",
            "pipeline_stages": [{"key": "search", "agents": ["Scholar", "Web"]}]
        }))
        .unwrap();
        BundleWriter::new(dir).unwrap().write(&compile(&seed).unwrap()).unwrap()
    }

    #[test]
    fn test_open_indexes_specs() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_bundle(dir.path());
        let bundle = BundleReader::open(&root).unwrap();

        assert_eq!(bundle.specs.len(), bundle.manifest.nodes.len());
        let scholar = bundle.spec(&AgentId::new("search.scholar").unwrap()).unwrap();
        assert_eq!(scholar.spec.stage, "search");
        assert_eq!(scholar.spec.depends_on[0].as_str(), "search.coordinator");
        assert!(BundleReader::policy_snapshot(&root).unwrap().is_some());
        assert_eq!(BundleReader::parallel_groups(&root).unwrap().unwrap().groups.len(), 1);
    }

    #[test]
    fn test_missing_pieces_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = BundleReader::open(dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), "BundleNotFound");

        let root = write_bundle(dir.path());
        fs::remove_file(root.join(PIPELINE_FILE)).unwrap();
        assert_eq!(BundleReader::open(&root).unwrap_err().kind(), "BundleNotFound");
    }

    #[test]
    fn test_duplicate_spec_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_bundle(dir.path());
        fs::copy(
            root.join("agents/search/scholar.acl"),
            root.join("agents/search/scholar_copy.acl"),
        )
        .unwrap();
        assert_eq!(BundleReader::open(&root).unwrap_err().kind(), "InvalidBundle");
    }

    #[test]
    fn test_unparseable_manifest_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_bundle(dir.path());
        fs::write(root.join(MANIFEST_FILE), "{ not json").unwrap();
        assert_eq!(BundleReader::open(&root).unwrap_err().kind(), "InvalidBundle");
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Build Orchestration Use Case
//!
//! Loads a seed, compiles it and writes the result.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Seed source → compiled orchestration → files on disk
//! - **Collaborators:**
//!   - Infrastructure: SeedLoader, BundleWriter
//!   - Application: compiler
//!
//! # Flow
//!
//! 1. Load and route the seed (pipeline or flat)
//! 2. Compile it in memory; any seed defect stops here, before a file exists
//! 3. Pipeline seeds write a full bundle tree, flat seeds a single manifest

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::application::compiler::{compile, compile_flat, CompiledOrchestration};
use crate::domain::manifest::FlatGraphManifest;
use crate::domain::seed::{Seed, SeedError};
use crate::infrastructure::bundle_writer::{BundleWriteError, BundleWriter};
use crate::infrastructure::seed_loader::{SeedLoader, SeedSource};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Write(#[from] BundleWriteError),
}

impl BuildError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Seed(e) => e.kind(),
            Self::Write(e) => e.kind(),
        }
    }
}

/// A seed compiled in memory.
#[derive(Debug, Clone)]
pub enum CompiledSeed {
    Pipeline(Box<CompiledOrchestration>),
    Flat(FlatGraphManifest),
}

impl CompiledSeed {
    pub fn agent_count(&self) -> usize {
        match self {
            Self::Pipeline(compiled) => compiled.manifest.nodes.len(),
            Self::Flat(manifest) => manifest.nodes.len(),
        }
    }

    pub fn edge_count(&self) -> usize {
        match self {
            Self::Pipeline(compiled) => compiled.manifest.edges.len(),
            Self::Flat(manifest) => manifest.edges.len(),
        }
    }
}

/// What a build produced on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildResult {
    Bundle {
        root: PathBuf,
        manifest_path: PathBuf,
        agent_count: usize,
        edge_count: usize,
    },
    Flat {
        manifest_path: PathBuf,
        agent_count: usize,
        edge_count: usize,
    },
}

impl BuildResult {
    pub fn manifest_path(&self) -> &Path {
        match self {
            Self::Bundle { manifest_path, .. } | Self::Flat { manifest_path, .. } => manifest_path,
        }
    }

    pub fn bundle_root(&self) -> Option<&Path> {
        match self {
            Self::Bundle { root, .. } => Some(root),
            Self::Flat { .. } => None,
        }
    }
}

pub fn compile_seed(source: impl Into<SeedSource>) -> Result<CompiledSeed, SeedError> {
    match SeedLoader::load(source)? {
        Seed::Pipeline(seed) => Ok(CompiledSeed::Pipeline(Box::new(compile(&seed)?))),
        Seed::Flat(seed) => Ok(CompiledSeed::Flat(compile_flat(&seed)?)),
    }
}

/// Build a seed into `output_dir`. `filename` names the flat manifest and is
/// ignored for pipeline seeds.
pub fn build_orchestration(
    source: impl Into<SeedSource>,
    output_dir: impl Into<PathBuf>,
    filename: Option<&str>,
) -> Result<BuildResult, BuildError> {
    let compiled = compile_seed(source)?;
    let writer = BundleWriter::new(output_dir)?;

    let result = match compiled {
        CompiledSeed::Pipeline(compiled) => {
            let root = writer.write(&compiled)?;
            BuildResult::Bundle {
                manifest_path: root.join(crate::domain::manifest::MANIFEST_FILE),
                root,
                agent_count: compiled.manifest.nodes.len(),
                edge_count: compiled.manifest.edges.len(),
            }
        }
        CompiledSeed::Flat(manifest) => BuildResult::Flat {
            manifest_path: writer.write_flat(&manifest, filename)?,
            agent_count: manifest.nodes.len(),
            edge_count: manifest.edges.len(),
        },
    };

    info!(
        manifest = %result.manifest_path().display(),
        "Orchestration build complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipeline_build_result() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_orchestration(
            json!({"name": "Tiny", "pipeline_stages": [{"key": "s", "agents": ["A"]}]}),
            dir.path(),
            Some("ignored.json"),
        )
        .unwrap();
        assert_eq!(result.bundle_root(), Some(dir.path().join("tiny").as_path()));
        assert!(result.manifest_path().ends_with("orchestration_summary.json"));
        assert!(matches!(result, BuildResult::Bundle { agent_count: 8, .. }));
        assert!(!dir.path().join("ignored.json").exists());
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bundle Writer
//!
//! Materializes a [`CompiledOrchestration`] under `<output_dir>/<bundle_name>/`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist compiled bundle documents to the local filesystem
//! - **Integration:** Graph compiler output → bundle tree → pipeline executor
//!
//! # Write order
//!
//! Flows, agent specs, prompts, gates, policies, checks and the README are
//! written first. The manifest (`orchestration_summary.json`) goes last, so a
//! bundle without a manifest is detectably incomplete. A manifest left by an
//! earlier write is removed before anything else is touched.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::compiler::CompiledOrchestration;
use crate::domain::gate::GATES_DIR;
use crate::domain::manifest::{FlatGraphManifest, FLAT_MANIFEST_FILE, MANIFEST_FILE};
use crate::domain::path_sanitizer::PathSanitizer;
use crate::domain::pipeline::{FEEDBACK_LOOPS_FILE, PARALLEL_GROUPS_FILE, PIPELINE_FILE};
use crate::domain::policy::POLICY_SNAPSHOT_FILE;
use crate::infrastructure::prompt_template_engine::{
    PromptContext, PromptTemplateEngine, ReadmeContext,
};

pub const README_FILE: &str = "README.md";

#[derive(Debug, Error)]
pub enum BundleWriteError {
    #[error("Failed to write {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to serialize {path}: {error}")]
    Serialize { path: String, error: String },

    #[error("Template rendering failed: {0}")]
    Template(String),
}

impl BundleWriteError {
    pub fn kind(&self) -> &'static str {
        "BundleWrite"
    }
}

pub struct BundleWriter {
    output_dir: PathBuf,
    templates: PromptTemplateEngine,
    sanitizer: PathSanitizer,
}

impl BundleWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, BundleWriteError> {
        let templates =
            PromptTemplateEngine::new().map_err(|e| BundleWriteError::Template(format!("{:#}", e)))?;
        Ok(Self {
            output_dir: output_dir.into(),
            templates,
            sanitizer: PathSanitizer::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the full bundle tree and return its root.
    pub fn write(&self, compiled: &CompiledOrchestration) -> Result<PathBuf, BundleWriteError> {
        let root = self.output_dir.join(&compiled.bundle_name);
        create_dir(&root)?;
        remove_stale_manifest(&root)?;

        self.write_yaml(&root, PIPELINE_FILE, &compiled.pipeline)?;
        self.write_yaml(&root, FEEDBACK_LOOPS_FILE, &compiled.feedback_loops)?;
        self.write_yaml(&root, PARALLEL_GROUPS_FILE, &compiled.parallel_groups)?;

        for spec in &compiled.agent_specs {
            self.write_yaml(&root, &spec.relative_path, &spec.document)?;
        }
        debug!(count = compiled.agent_specs.len(), "Wrote agent specs");

        for prompt in &compiled.prompts {
            let context = PromptContext::new(
                prompt.agent_name.as_str(),
                &prompt.variant,
                prompt.stage_label.as_str(),
                &prompt.policies,
            );
            let text = self
                .templates
                .render_prompt(&context)
                .map_err(|e| BundleWriteError::Template(format!("{:#}", e)))?;
            self.write_text(&root, &prompt.relative_path(), &text)?;
        }
        debug!(count = compiled.prompts.len(), "Wrote prompt templates");

        for gate in &compiled.gates {
            self.write_yaml(&root, &format!("{}/{}", GATES_DIR, gate.file_name()), gate)?;
        }

        self.write_json(&root, POLICY_SNAPSHOT_FILE, &compiled.policy_snapshot)?;

        for (relative_path, suite) in &compiled.check_suites {
            self.write_yaml(&root, relative_path, suite)?;
        }

        let readme = self
            .templates
            .render_readme(&ReadmeContext::new(compiled.name.as_str(), &compiled.description))
            .map_err(|e| BundleWriteError::Template(format!("{:#}", e)))?;
        self.write_text(&root, README_FILE, &readme)?;

        self.write_json(&root, MANIFEST_FILE, &compiled.manifest)?;

        info!(
            root = %root.display(),
            agents = compiled.manifest.nodes.len(),
            edges = compiled.manifest.edges.len(),
            "Orchestration bundle written"
        );

        Ok(root)
    }

    /// Write a flat graph manifest directly into the output directory.
    pub fn write_flat(
        &self,
        manifest: &FlatGraphManifest,
        filename: Option<&str>,
    ) -> Result<PathBuf, BundleWriteError> {
        create_dir(&self.output_dir)?;
        let path = self.write_json(&self.output_dir, filename.unwrap_or(FLAT_MANIFEST_FILE), manifest)?;
        info!(path = %path.display(), nodes = manifest.nodes.len(), "Flat graph manifest written");
        Ok(path)
    }

    fn write_yaml<T: Serialize>(
        &self,
        root: &Path,
        relative: &str,
        value: &T,
    ) -> Result<PathBuf, BundleWriteError> {
        let text = serde_yaml::to_string(value).map_err(|e| BundleWriteError::Serialize {
            path: relative.to_string(),
            error: e.to_string(),
        })?;
        self.write_text(root, relative, &text)
    }

    fn write_json<T: Serialize>(
        &self,
        root: &Path,
        relative: &str,
        value: &T,
    ) -> Result<PathBuf, BundleWriteError> {
        let mut text = serde_json::to_string_pretty(value).map_err(|e| BundleWriteError::Serialize {
            path: relative.to_string(),
            error: e.to_string(),
        })?;
        text.push('\n');
        self.write_text(root, relative, &text)
    }

    fn write_text(&self, root: &Path, relative: &str, text: &str) -> Result<PathBuf, BundleWriteError> {
        let target = self
            .sanitizer
            .resolve(root, relative)
            .map_err(|e| BundleWriteError::Io {
                path: relative.to_string(),
                error: e.to_string(),
            })?;
        if let Some(parent) = target.absolute.parent() {
            create_dir(parent)?;
        }
        fs::write(&target.absolute, text).map_err(|e| BundleWriteError::Io {
            path: target.absolute.display().to_string(),
            error: e.to_string(),
        })?;
        Ok(target.absolute)
    }
}

fn remove_stale_manifest(root: &Path) -> Result<(), BundleWriteError> {
    let path = root.join(MANIFEST_FILE);
    match fs::remove_file(&path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed manifest from previous write");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BundleWriteError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        }),
    }
}

fn create_dir(path: &Path) -> Result<(), BundleWriteError> {
    fs::create_dir_all(path).map_err(|e| BundleWriteError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::compiler::{compile, compile_flat};
    use crate::domain::agent_spec::AgentSpecDocument;
    use crate::domain::manifest::OrchestrationManifest;
    use serde_json::json;

    fn compiled() -> CompiledOrchestration {
        let seed = serde_json::from_value(json!({
            "name": "Mini Research",
            "policies": {"max_research_depth": 2},
            "pipeline_stages": [
                {"key": "search", "label": "Search", "agents": ["Scholar Agent", "Web Agent"]}
            ]
        }))
        .unwrap();
        compile(&seed).unwrap()
    }

    #[test]
    fn test_writes_bundle_tree() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BundleWriter::new(dir.path()).unwrap();
        let root = writer.write(&compiled()).unwrap();

        assert_eq!(root, dir.path().join("mini_research"));
        for relative in [
            MANIFEST_FILE,
            PIPELINE_FILE,
            FEEDBACK_LOOPS_FILE,
            PARALLEL_GROUPS_FILE,
            POLICY_SNAPSHOT_FILE,
            README_FILE,
            "agents/search/scholar_agent.acl",
            "agents/search/search_coordinator.acl",
            "agents/orchestration/orchestration_supervisor.acl",
            "prompts/search/scholar_agent_primary.md",
            "prompts/search/search_coordination.md",
            "prompts/orchestration/supervisor_monitor.md",
            "gates/g_validation_passed.yaml",
            "tests/pipeline_e2e.yaml",
            "tests/parallel_agents.yaml",
        ] {
            assert!(root.join(relative).is_file(), "missing {}", relative);
        }

        let manifest: OrchestrationManifest =
            serde_json::from_str(&fs::read_to_string(root.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest.nodes.len(), 2 + 1 + 6);

        let spec: AgentSpecDocument = serde_yaml::from_str(
            &fs::read_to_string(root.join("agents/search/scholar_agent.acl")).unwrap(),
        )
        .unwrap();
        assert_eq!(spec.agent.id.as_str(), "search.scholar_agent");
        assert_eq!(
            spec.agent.primary_prompt(),
            Some("prompts/search/scholar_agent_primary.md")
        );

        let prompt = fs::read_to_string(root.join("prompts/search/scholar_agent_primary.md")).unwrap();
        assert!(prompt.starts_with("# Scholar Agent :: Scholar Agent Primary\nStage: Search\n"));
        assert!(prompt.contains("- policy.research_depth\n"));
    }

    #[test]
    fn test_manifest_is_byte_identical_across_writes() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = BundleWriter::new(first.path()).unwrap().write(&compiled()).unwrap();
        let b = BundleWriter::new(second.path()).unwrap().write(&compiled()).unwrap();
        assert_eq!(
            fs::read(a.join(MANIFEST_FILE)).unwrap(),
            fs::read(b.join(MANIFEST_FILE)).unwrap()
        );
    }

    #[test]
    fn test_failed_rewrite_leaves_no_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BundleWriter::new(dir.path()).unwrap();
        let root = writer.write(&compiled()).unwrap();
        assert!(root.join(MANIFEST_FILE).is_file());

        // A directory where the pipeline file belongs makes the rewrite fail.
        fs::remove_file(root.join(PIPELINE_FILE)).unwrap();
        fs::create_dir_all(root.join(PIPELINE_FILE)).unwrap();

        let err = writer.write(&compiled()).unwrap_err();
        assert!(matches!(err, BundleWriteError::Io { .. }));
        assert!(!root.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_write_flat_only_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let seed = serde_json::from_value(json!({
            "agents": [{"id": "a", "depends_on": ["b"]}, {"id": "b"}]
        }))
        .unwrap();
        let manifest = compile_flat(&seed).unwrap();
        let writer = BundleWriter::new(dir.path()).unwrap();

        let path = writer.write_flat(&manifest, None).unwrap();
        assert_eq!(path, dir.path().join(FLAT_MANIFEST_FILE));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

        let custom = writer.write_flat(&manifest, Some("graph.json")).unwrap();
        assert!(custom.ends_with("graph.json"));
        assert!(writer.write_flat(&manifest, Some("../escape.json")).is_err());
    }
}

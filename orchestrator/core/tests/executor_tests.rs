// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the pipeline executor
//!
//! Each test builds the two-stage fixture into a temp directory and drives it
//! with a stub provider returning `fake-response-<n>`.

use aether_core::application::build_orchestration::build_orchestration;
use aether_core::application::executor::PipelineExecutor;
use aether_core::domain::audit::AuditManifest;
use aether_core::domain::identifiers::AgentId;
use aether_core::domain::llm::{LLMError, LLMProvider};
use aether_core::infrastructure::bundle_reader::BundleReader;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct StubLLM {
    calls: AtomicUsize,
}

impl StubLLM {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for StubLLM {
    async fn generate(&self, _prompt: &str, _context: Option<&str>) -> Result<String, LLMError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("fake-response-{}", index))
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

fn build_minimal(dir: &Path) -> PathBuf {
    let seed = PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/minimal_two_stage.yaml"
    ));
    build_orchestration(seed, dir, None)
        .unwrap()
        .bundle_root()
        .unwrap()
        .to_path_buf()
}

fn read_audit(path: &Path) -> AuditManifest {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn output_files(root: &Path) -> usize {
    std::fs::read_dir(root.join("outputs"))
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_partial_run_respects_max_agents() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_minimal(dir.path());
    let llm = StubLLM::new();
    let mut executor = PipelineExecutor::new(&root, llm.clone()).unwrap();

    let audit_path = executor.run(Some(4), false).await.unwrap();
    assert!(audit_path.ends_with("audit/orchestration_run.json"));

    let audit = read_audit(&audit_path);
    assert_eq!(llm.calls(), 4);
    assert_eq!(output_files(&root), 4);
    assert_eq!(audit.output_count, 4);
    assert_eq!(audit.entries.len(), 4);
    for entry in &audit.entries {
        assert!(entry.output_file.starts_with("outputs/"));
        assert!(root.join(&entry.output_file).is_file());
    }
}

#[tokio::test]
async fn test_full_run_executes_every_node() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_minimal(dir.path());
    let mut executor = PipelineExecutor::new(&root, StubLLM::new()).unwrap();

    let audit = read_audit(&executor.run(None, true).await.unwrap());
    assert_eq!(audit.output_count, audit.entries.len());
    assert!(audit.entries.len() >= 10);

    let bundle = BundleReader::open(&root).unwrap();
    let mut expected = HashSet::new();
    for stage in &bundle.pipeline.stages {
        expected.extend(stage.agents.iter().cloned());
        expected.extend(stage.coordinator.iter().cloned());
    }
    expected.extend(bundle.pipeline.global_agents.iter().cloned());

    let executed: HashSet<AgentId> = audit.executed_ids().cloned().collect();
    assert_eq!(executed, expected);
    assert_eq!(executed.len(), 16);
}

#[tokio::test]
async fn test_dependencies_precede_dependents() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_minimal(dir.path());
    let mut executor = PipelineExecutor::new(&root, StubLLM::new()).unwrap();
    let audit = read_audit(&executor.run(None, true).await.unwrap());

    let mut seen = HashSet::new();
    for entry in &audit.entries {
        for dependency in &entry.dependencies {
            assert!(
                seen.contains(dependency),
                "{} listed {} before it ran",
                entry.agent_id,
                dependency
            );
        }
        seen.insert(entry.agent_id.clone());
    }
    let supervisor = audit
        .entries
        .iter()
        .find(|e| e.agent_id.as_str() == "orchestration.supervisor")
        .unwrap();
    assert_eq!(supervisor.dependencies.len(), 2);
}

#[tokio::test]
async fn test_repeated_runs_produce_identical_entries() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_minimal(dir.path());

    let mut signatures = Vec::new();
    for _ in 0..2 {
        let mut executor = PipelineExecutor::new(&root, StubLLM::new()).unwrap();
        let audit = read_audit(&executor.run(None, true).await.unwrap());
        let signature: Vec<_> = audit
            .entries
            .into_iter()
            .map(|e| (e.agent_id, e.stage, e.prompt_file, e.dependencies, e.output_file))
            .collect();
        signatures.push(signature);
    }
    assert_eq!(signatures[0], signatures[1]);
}

#[tokio::test]
async fn test_zero_max_agents_writes_empty_audit() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_minimal(dir.path());
    let llm = StubLLM::new();
    let mut executor = PipelineExecutor::new(&root, llm.clone()).unwrap();

    let audit = read_audit(&executor.run(Some(0), true).await.unwrap());
    assert_eq!(audit.output_count, 0);
    assert!(audit.entries.is_empty());
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_skip_coordinators() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_minimal(dir.path());
    let mut executor = PipelineExecutor::new(&root, StubLLM::new()).unwrap();

    let audit = read_audit(&executor.run(None, false).await.unwrap());
    assert!(audit
        .executed_ids()
        .all(|id| !id.as_str().ends_with(".coordinator")));
    assert_eq!(audit.entries.len(), 3 + 5 + 6);

    let globals: Vec<&AgentId> = audit
        .executed_ids()
        .filter(|id| id.as_str().starts_with("orchestration."))
        .collect();
    assert_eq!(globals.len(), 6);
    let supervisor = audit
        .entries
        .iter()
        .find(|e| e.agent_id.as_str() == "orchestration.supervisor")
        .unwrap();
    assert!(supervisor.dependencies.is_empty());
    assert_eq!(supervisor.declared_dependencies.len(), 2);
}

#[tokio::test]
async fn test_policy_enforcement_records_decisions() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_minimal(dir.path());
    let mut executor = PipelineExecutor::new(&root, StubLLM::new())
        .unwrap()
        .with_bundle_policies()
        .unwrap();

    let audit = read_audit(&executor.run(None, true).await.unwrap());
    assert_eq!(audit.entries.len(), 16);
    assert_eq!(audit.policy_decisions.len(), 16);
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pipeline Executor
//!
//! Drives an LLM through a bundle's agents in dependency order and records
//! one audit entry per invocation.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Schedule agents, fold upstream outputs into context,
//!   persist outputs and the audit manifest
//! - **Collaborators:**
//!   - Domain: LLMProvider, PolicyEnforcer, AuditManifest
//!   - Infrastructure: BundleReader
//!
//! # Schedule
//!
//! 1. Each pipeline stage in order: specialists in declared order, then the
//!    coordinator when coordinators are included
//! 2. Every remaining manifest node that has a spec, in manifest order
//!    (global agents and spec-only nodes). Skipped coordinators stay skipped.
//! 3. `max_agents` caps the number of scheduled agents, memoized and skipped
//!    ones included; the audit is still written
//!
//! Execution is strictly sequential. Errors abort the run without an audit
//! manifest, so a partial run caused by `max_agents` or a policy truncation
//! is distinguishable from a failed one.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::audit::{AuditEntry, AuditManifest, StopReason, AUDIT_DIR, AUDIT_FILE, OUTPUTS_DIR};
use crate::domain::identifiers::AgentId;
use crate::domain::llm::{LLMError, LLMProvider};
use crate::domain::path_sanitizer::PathSanitizer;
use crate::domain::policy::{
    GuardRequest, PolicyDecision, PolicyDecisionRecord, PolicyEnforcer, PolicySnapshot, RuntimeState,
};
use crate::infrastructure::bundle_reader::{BundleReadError, BundleReader, LoadedBundle};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Bundle not found: {0}")]
    BundleNotFound(String),

    #[error("Invalid bundle: {0}")]
    InvalidBundle(String),

    #[error("Prompt file not found for agent {agent_id}: {path}")]
    MissingPrompt { agent_id: AgentId, path: String },

    #[error("Policy denied agent {agent_id}: {reason}")]
    PolicyDenied { agent_id: AgentId, reason: String },

    #[error("I/O error on {path}: {error}")]
    Io { path: String, error: String },

    #[error("LLM call failed for agent {agent_id}")]
    Llm {
        agent_id: AgentId,
        #[source]
        source: LLMError,
    },
}

impl ExecutorError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BundleNotFound(_) => "BundleNotFound",
            Self::InvalidBundle(_) => "InvalidBundle",
            Self::MissingPrompt { .. } => "MissingPrompt",
            Self::PolicyDenied { .. } => "PolicyDenied",
            Self::Io { .. } => "Io",
            Self::Llm { source, .. } => source.kind(),
        }
    }

    fn io(path: &Path, error: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

impl From<BundleReadError> for ExecutorError {
    fn from(error: BundleReadError) -> Self {
        match error {
            BundleReadError::NotFound(message) => Self::BundleNotFound(message),
            BundleReadError::Invalid(message) => Self::InvalidBundle(message),
            BundleReadError::Io { path, error } => Self::Io { path, error },
        }
    }
}

/// Memoized result of one agent.
#[derive(Debug, Clone)]
struct AgentOutput {
    text: String,
    stage: String,
    depth: u32,
}

enum Step {
    Executed,
    Memoized,
    Skipped,
    Truncated,
}

struct PolicyGuard {
    enforcer: PolicyEnforcer,
    state: RuntimeState,
}

pub struct PipelineExecutor {
    bundle: LoadedBundle,
    llm: Arc<dyn LLMProvider>,
    sanitizer: PathSanitizer,
    outputs: HashMap<AgentId, AgentOutput>,
    entries: Vec<AuditEntry>,
    policy: Option<PolicyGuard>,
    decisions: Vec<PolicyDecisionRecord>,
}

impl PipelineExecutor {
    /// Load the bundle at `root`.
    pub fn new(root: impl AsRef<Path>, llm: Arc<dyn LLMProvider>) -> Result<Self, ExecutorError> {
        let bundle = BundleReader::open(root)?;
        info!(
            root = %bundle.root.display(),
            specs = bundle.specs.len(),
            model = %llm.model(),
            "Pipeline executor ready"
        );
        Ok(Self {
            bundle,
            llm,
            sanitizer: PathSanitizer::new(),
            outputs: HashMap::new(),
            entries: Vec::new(),
            policy: None,
            decisions: Vec::new(),
        })
    }

    /// Guard every agent with `enforcer` against a whole-run `budget`.
    pub fn with_policy_enforcer(mut self, enforcer: PolicyEnforcer, budget: Duration) -> Self {
        self.policy = Some(PolicyGuard {
            enforcer,
            state: RuntimeState::new(budget),
        });
        self
    }

    /// Guard with thresholds from the bundle's governance snapshot.
    pub fn with_bundle_policies(self) -> Result<Self, ExecutorError> {
        let snapshot = BundleReader::policy_snapshot(&self.bundle.root)?
            .unwrap_or_else(|| PolicySnapshot::from_seed(&Default::default()));
        let enforcer = PolicyEnforcer::from_snapshot(&snapshot);
        debug!(?enforcer, "Policy enforcement enabled");
        Ok(self.with_policy_enforcer(enforcer, snapshot.orchestration_budget()))
    }

    pub fn bundle(&self) -> &LoadedBundle {
        &self.bundle
    }

    pub fn root(&self) -> &Path {
        &self.bundle.root
    }

    /// Execute the bundle and return the audit manifest path.
    pub async fn run(
        &mut self,
        max_agents: Option<usize>,
        include_coordinators: bool,
    ) -> Result<PathBuf, ExecutorError> {
        let outputs_dir = self.bundle.root.join(OUTPUTS_DIR);
        fs::create_dir_all(&outputs_dir)
            .await
            .map_err(|e| ExecutorError::io(&outputs_dir, e))?;

        let run_started = Instant::now();
        let mut executed = 0usize;
        let mut stop_reason = StopReason::Completed;

        let mut scheduled = 0usize;

        for agent_id in self.schedule(include_coordinators) {
            if max_agents.is_some_and(|max| scheduled >= max) {
                stop_reason = StopReason::MaxAgents;
                break;
            }
            if let Some(guard) = self.policy.as_mut() {
                guard.state.elapsed = run_started.elapsed();
            }
            match self.execute_agent(&agent_id).await? {
                Step::Executed => {
                    executed += 1;
                    scheduled += 1;
                }
                Step::Memoized | Step::Skipped => scheduled += 1,
                Step::Truncated => {
                    stop_reason = StopReason::PolicyTruncated;
                    break;
                }
            }
        }

        info!(executed, scheduled, ?stop_reason, "Pipeline run finished");
        self.write_audit(stop_reason).await
    }

    fn schedule(&self, include_coordinators: bool) -> Vec<AgentId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();

        for stage in &self.bundle.pipeline.stages {
            for agent_id in &stage.agents {
                if seen.insert(agent_id.clone()) {
                    order.push(agent_id.clone());
                }
            }
            if let Some(coordinator) = &stage.coordinator {
                if include_coordinators && seen.insert(coordinator.clone()) {
                    order.push(coordinator.clone());
                }
            }
        }

        if !include_coordinators {
            seen.extend(
                self.bundle
                    .pipeline
                    .stages
                    .iter()
                    .filter_map(|stage| stage.coordinator.clone()),
            );
        }

        for node in &self.bundle.manifest.nodes {
            if self.bundle.specs.contains_key(&node.id) && seen.insert(node.id.clone()) {
                order.push(node.id.clone());
            }
        }

        order
    }

    async fn execute_agent(&mut self, agent_id: &AgentId) -> Result<Step, ExecutorError> {
        if self.outputs.contains_key(agent_id) {
            return Ok(Step::Memoized);
        }
        let Some(record) = self.bundle.spec(agent_id) else {
            warn!(agent_id = %agent_id, "No spec for pipeline agent, skipping");
            return Ok(Step::Skipped);
        };
        let spec = record.spec.clone();

        let Some(primary) = spec.primary_prompt() else {
            return Err(ExecutorError::MissingPrompt {
                agent_id: agent_id.clone(),
                path: "(no prompts declared)".to_string(),
            });
        };
        let prompt_path = self
            .sanitizer
            .resolve(&self.bundle.root, primary)
            .map_err(|e| ExecutorError::InvalidBundle(format!("agent {}: {}", agent_id, e)))?;
        if !prompt_path.absolute.is_file() {
            return Err(ExecutorError::MissingPrompt {
                agent_id: agent_id.clone(),
                path: prompt_path.relative,
            });
        }
        let prompt_text = fs::read_to_string(&prompt_path.absolute)
            .await
            .map_err(|e| ExecutorError::io(&prompt_path.absolute, e))?;

        let mut dependencies = Vec::new();
        let mut chunks = Vec::new();
        let mut depth = 1;
        for dependency in &spec.depends_on {
            if let Some(output) = self.outputs.get(dependency) {
                chunks.push(format!("## Output from {}\n{}\n", dependency, output.text));
                dependencies.push(dependency.clone());
                depth = depth.max(output.depth + 1);
            }
        }
        let context = (!chunks.is_empty()).then(|| chunks.join("\n"));

        if let Some(guard) = &self.policy {
            let request = GuardRequest::new(agent_id.clone(), spec.stage.as_str(), depth);
            let decision = guard.enforcer.guard(&guard.state, &request);
            self.decisions.push(decision.record(agent_id, &spec.stage));
            match decision.decision {
                PolicyDecision::Allow => {}
                PolicyDecision::Escalate => {
                    warn!(agent_id = %agent_id, reason = %decision.reason, "Policy escalation");
                }
                PolicyDecision::Truncate => {
                    warn!(agent_id = %agent_id, reason = %decision.reason, "Policy truncated the run");
                    return Ok(Step::Truncated);
                }
                PolicyDecision::Deny => {
                    return Err(ExecutorError::PolicyDenied {
                        agent_id: agent_id.clone(),
                        reason: decision.reason,
                    });
                }
            }
        }

        info!(agent_id = %agent_id, stage = %spec.stage, depth, "Executing agent");
        let started_at = Utc::now();
        let timer = Instant::now();
        let text = self
            .llm
            .generate(&prompt_text, context.as_deref())
            .await
            .map_err(|source| ExecutorError::Llm {
                agent_id: agent_id.clone(),
                source,
            })?;
        let duration_ms = timer.elapsed().as_secs_f64() * 1000.0;

        let output_relative = format!("{}/{}.md", OUTPUTS_DIR, agent_id.file_stem());
        let output_path = self.bundle.root.join(&output_relative);
        fs::write(&output_path, &text)
            .await
            .map_err(|e| ExecutorError::io(&output_path, e))?;

        metrics::counter!("aether_agents_executed_total", "stage" => spec.stage.clone()).increment(1);
        metrics::histogram!("aether_agent_duration_ms").record(duration_ms);
        if let Some(guard) = self.policy.as_mut() {
            guard.state.agents_executed += 1;
        }

        self.entries.push(AuditEntry {
            agent_id: agent_id.clone(),
            stage: spec.stage.clone(),
            prompt_file: prompt_path.relative,
            dependencies,
            declared_dependencies: spec.depends_on.clone(),
            output_file: output_relative,
            started_at,
            duration_ms,
            model: self.llm.model().to_string(),
        });
        self.outputs.insert(
            agent_id.clone(),
            AgentOutput {
                text,
                stage: spec.stage,
                depth,
            },
        );

        debug!(agent_id = %agent_id, duration_ms, "Agent finished");
        Ok(Step::Executed)
    }

    async fn write_audit(&self, stop_reason: StopReason) -> Result<PathBuf, ExecutorError> {
        let audit_dir = self.bundle.root.join(AUDIT_DIR);
        fs::create_dir_all(&audit_dir)
            .await
            .map_err(|e| ExecutorError::io(&audit_dir, e))?;

        let manifest = AuditManifest::new(
            Uuid::new_v4(),
            self.llm.model(),
            self.outputs.len(),
            stop_reason,
            self.entries.clone(),
            self.decisions.clone(),
        );
        let audit_path = audit_dir.join(AUDIT_FILE);
        let json = serde_json::to_string_pretty(&manifest).map_err(|e| ExecutorError::Io {
            path: audit_path.display().to_string(),
            error: e.to_string(),
        })?;
        fs::write(&audit_path, json)
            .await
            .map_err(|e| ExecutorError::io(&audit_path, e))?;

        info!(
            path = %audit_path.display(),
            entries = manifest.entries.len(),
            "Audit manifest written"
        );
        Ok(audit_path)
    }

    /// Stage recorded for an executed agent.
    pub fn executed_stage(&self, agent_id: &AgentId) -> Option<&str> {
        self.outputs.get(agent_id).map(|output| output.stage.as_str())
    }
}

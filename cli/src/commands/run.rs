// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aether run` / `aether-run` - execute a bundle through an LLM provider
//!
//! Flags override the runner configuration: `--model` replaces `llm.model`,
//! `--offline` switches the provider, `--max-agents` and
//! `--skip-coordinators` replace the `execution` defaults.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use aether_core::application::executor::PipelineExecutor;
use aether_core::domain::runner_config::{ProviderKind, RunnerConfigManifest};
use aether_core::infrastructure::llm::provider_from_config;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Bundle root (the directory holding orchestration_summary.json)
    #[arg(value_name = "ORCHESTRATION_PATH")]
    pub orchestration_path: PathBuf,

    /// Model identifier (default: configured model, gemini-2.0-flash-exp)
    #[arg(long)]
    pub model: Option<String>,

    /// Stop after this many agent invocations
    #[arg(long, value_name = "N")]
    pub max_agents: Option<usize>,

    /// Skip stage coordinator agents
    #[arg(long)]
    pub skip_coordinators: bool,

    /// Use the deterministic offline provider instead of Gemini
    #[arg(long)]
    pub offline: bool,

    /// Guard every agent with the bundle's governance policies
    #[arg(long)]
    pub enforce_policies: bool,
}

pub async fn execute(args: RunArgs, config: &RunnerConfigManifest) -> Result<PathBuf> {
    let mut llm = config.spec.llm.clone();
    if let Some(model) = args.model {
        llm.model = model;
    }
    if args.offline {
        llm.provider = ProviderKind::Offline;
    }

    let execution = &config.spec.execution;
    let max_agents = args.max_agents.or(execution.max_agents);
    let include_coordinators = execution.include_coordinators && !args.skip_coordinators;
    let enforce_policies = execution.enforce_policies || args.enforce_policies;

    let provider = provider_from_config(&llm)?;
    let mut executor = PipelineExecutor::new(&args.orchestration_path, provider)?;
    if enforce_policies {
        executor = executor.with_bundle_policies()?;
    }

    info!(
        bundle = %args.orchestration_path.display(),
        ?max_agents,
        include_coordinators,
        enforce_policies,
        "Running orchestration"
    );
    let audit_path = executor.run(max_agents, include_coordinators).await?;

    println!(
        "{}",
        format!("✓ Audit trail written to {}", audit_path.display()).green()
    );
    Ok(audit_path)
}

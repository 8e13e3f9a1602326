// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aether build` - compile a seed and write its bundle

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use aether_core::application::build_orchestration::{build_orchestration, BuildResult};

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Seed file (YAML or JSON)
    #[arg(value_name = "SEED")]
    pub seed: PathBuf,

    /// Output directory for the bundle
    #[arg(short, long, default_value = "build", value_name = "DIR")]
    pub output: PathBuf,

    /// Manifest file name for flat seeds
    #[arg(long, value_name = "NAME")]
    pub filename: Option<String>,
}

pub fn execute(args: BuildArgs) -> Result<BuildResult> {
    let result = build_orchestration(args.seed, args.output, args.filename.as_deref())?;

    match &result {
        BuildResult::Bundle {
            root,
            agent_count,
            edge_count,
            ..
        } => {
            println!(
                "{}",
                format!("✓ Bundle written to {}", root.display()).green()
            );
            println!("  Agents: {}", agent_count);
            println!("  Edges: {}", edge_count);
        }
        BuildResult::Flat {
            manifest_path,
            agent_count,
            edge_count,
        } => {
            println!(
                "{}",
                format!("✓ Manifest written to {}", manifest_path.display()).green()
            );
            println!("  Agents: {}", agent_count);
            println!("  Edges: {}", edge_count);
        }
    }

    Ok(result)
}

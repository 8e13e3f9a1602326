// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aether validate` - compile a seed without writing anything

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use aether_core::application::build_orchestration::{compile_seed, CompiledSeed};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Seed file (YAML or JSON)
    #[arg(value_name = "SEED")]
    pub seed: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("Validating seed {}...", args.seed.display());
    let compiled = compile_seed(args.seed)?;

    let shape = match &compiled {
        CompiledSeed::Pipeline(orchestration) => {
            format!("pipeline seed, {} stages", orchestration.stages.len())
        }
        CompiledSeed::Flat(_) => "flat seed".to_string(),
    };
    println!("{}", format!("✓ Seed is valid ({})", shape).green());
    println!("  Agents: {}", compiled.agent_count());
    println!("  Edges: {}", compiled.edge_count());

    Ok(())
}

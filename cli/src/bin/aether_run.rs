// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aether-run` - single-purpose bundle executor
//!
//! Same behavior as `aether run`, for scripts that only ever execute bundles.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use aether_core::domain::runner_config::RunnerConfigManifest;
use aether_forge::commands::{self, RunArgs};
use aether_forge::{failure, logging};

/// Execute a generated orchestration bundle
#[derive(Parser)]
#[command(name = "aether-run")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, env = "AETHER_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "AETHER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(flatten)]
    run: RunArgs,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(error) = execute(cli).await {
        eprintln!("{}", failure::render(&error).red());
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = RunnerConfigManifest::load_or_default(cli.config)?;
    logging::init_logging(cli.log_level.as_deref(), &config.spec.observability.logging)?;
    commands::run::execute(cli.run, &config).await?;
    Ok(())
}

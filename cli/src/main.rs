// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Aether Forge CLI
//!
//! The `aether` binary compiles orchestration seeds into artifact bundles and
//! drives bundles through an LLM provider.
//!
//! ## Commands
//!
//! - `aether build|validate` - Seed compilation
//! - `aether run` - Sequential bundle execution with an audit trail
//! - `aether verify|gate` - Bundle checks and gate evaluation
//! - `aether config show|validate|generate` - Configuration management

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::warn;

use aether_core::domain::runner_config::RunnerConfigManifest;
use aether_forge::commands::{self, BuildArgs, ConfigCommand, GateArgs, RunArgs, ValidateArgs, VerifyArgs};
use aether_forge::{failure, logging};

/// Aether Forge - compile and run multi-stage agent orchestrations
#[derive(Parser)]
#[command(name = "aether")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AETHER_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AETHER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a seed and write its bundle
    #[command(name = "build")]
    Build(BuildArgs),

    /// Compile a seed without writing files
    #[command(name = "validate")]
    Validate(ValidateArgs),

    /// Execute a bundle through the configured LLM provider
    #[command(name = "run")]
    Run(RunArgs),

    /// Evaluate a bundle's check suites
    #[command(name = "verify")]
    Verify(VerifyArgs),

    /// Evaluate a bundle gate
    #[command(name = "gate")]
    Gate(GateArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{}", failure::render(&error).red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = RunnerConfigManifest::load_or_default(cli.config.clone());
    let (logging_config, config_error) = logging::logging_settings(&config);
    logging::init_logging(cli.log_level.as_deref(), &logging_config)?;
    if let Some(error) = config_error {
        warn!(%error, "Configuration not loaded, continuing with default logging settings");
    }

    match cli.command {
        Some(Commands::Build(args)) => commands::build::execute(args).map(|_| ()),
        Some(Commands::Validate(args)) => commands::validate::execute(args),
        Some(Commands::Run(args)) => commands::run::execute(args, &config?).await.map(|_| ()),
        Some(Commands::Verify(args)) => commands::verify::execute(args),
        Some(Commands::Gate(args)) => commands::gate::execute(args),
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config),
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

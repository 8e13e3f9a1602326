// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use aether_core::domain::runner_config::RunnerConfigManifest;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with every default spelled out
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./aether-config.yaml")]
        output: PathBuf,
    },
}

pub fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(output),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = RunnerConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. AETHER_CONFIG_PATH: {}",
            std::env::var("AETHER_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./aether-config.yaml");
        println!("  4. ~/.aether/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    let llm = &config.spec.llm;
    println!("{}", "LLM:".bold());
    println!("  Provider: {:?}", llm.provider);
    println!("  Model: {}", llm.model);
    println!("  Endpoint: {}", llm.endpoint);
    println!(
        "  API key: {}",
        if llm.resolve_api_key().is_some() {
            "configured".green()
        } else {
            "(from GEMINI_API_KEY / GOOGLE_API_KEY)".dimmed()
        }
    );
    println!("  Timeout: {:?}", llm.timeout);
    println!();

    let execution = &config.spec.execution;
    println!("{}", "Execution:".bold());
    println!("  Include coordinators: {}", execution.include_coordinators);
    println!(
        "  Max agents: {}",
        execution
            .max_agents
            .map(|n| n.to_string())
            .unwrap_or_else(|| "(unlimited)".to_string())
    );
    println!("  Enforce policies: {}", execution.enforce_policies);
    println!();

    let logging = &config.spec.observability.logging;
    println!("{}", "Logging:".bold());
    println!("  Level: {}", logging.level);
    println!("  Format: {}", logging.format);
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = RunnerConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: PathBuf) -> Result<()> {
    RunnerConfigManifest::default()
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_validates() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("aether-config.yaml");
        handle_command(ConfigCommand::Generate { output: output.clone() }, None).unwrap();

        let yaml = std::fs::read_to_string(&output).unwrap();
        assert!(yaml.contains("apiVersion: aether.dev/v1"));
        assert!(yaml.contains("kind: RunnerConfig"));

        handle_command(ConfigCommand::Validate { file: Some(output) }, None).unwrap();
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = handle_command(
            ConfigCommand::Validate {
                file: Some(dir.path().join("missing.yaml")),
            },
            None,
        );
        assert!(result.is_err());
    }
}

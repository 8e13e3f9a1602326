// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aether verify` - evaluate a bundle's check suites

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use aether_core::application::verify::BundleVerifier;

use crate::failure::CommandError;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Bundle root
    #[arg(value_name = "BUNDLE")]
    pub bundle: PathBuf,
}

pub fn execute(args: VerifyArgs) -> Result<()> {
    let report = BundleVerifier::verify(&args.bundle)?;

    println!("{}", format!("Bundle checks: {}", args.bundle.display()).bold());
    for result in &report.results {
        let line = format!("{}::{} - {}", result.suite, result.check, result.detail);
        if result.passed {
            println!("  {} {}", "✓".green(), line);
        } else {
            println!("  {} {}", "✗".red(), line);
        }
    }

    let failed = report.failures().count();
    if failed > 0 {
        return Err(CommandError::VerificationFailed {
            failed,
            total: report.results.len(),
        }
        .into());
    }

    println!("{}", "✓ All bundle checks passed".green());
    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aether gate` - evaluate one of a bundle's gates against supplied values

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use aether_core::domain::gate::{GateContext, GateDefinition, GATES_DIR, READY_STATUS};
use aether_core::infrastructure::bundle_reader::BundleReader;

use crate::failure::CommandError;

#[derive(Args, Debug)]
pub struct GateArgs {
    /// Bundle root
    #[arg(value_name = "BUNDLE")]
    pub bundle: PathBuf,

    /// Gate name, e.g. g_search_complete
    #[arg(value_name = "GATE")]
    pub gate: String,

    /// Required threshold
    #[arg(long)]
    pub required: f64,

    /// Achieved value
    #[arg(long)]
    pub achieved: f64,

    /// Upstream status
    #[arg(long, default_value = READY_STATUS)]
    pub status: String,
}

pub fn execute(args: GateArgs) -> Result<()> {
    BundleReader::open(&args.bundle)?;

    let relative = format!("{}/{}.yaml", GATES_DIR, args.gate.trim_end_matches(".yaml"));
    let gate: GateDefinition = BundleReader::yaml_document(&args.bundle, &relative)?.ok_or_else(|| {
        CommandError::GateNotFound {
            gate: args.gate.clone(),
            bundle: args.bundle.display().to_string(),
        }
    })?;

    let context = GateContext {
        required: args.required,
        achieved: args.achieved,
        status: args.status,
    };
    if !gate.evaluate(&context) {
        return Err(CommandError::GateFailed {
            gate: gate.name,
            required: context.required,
            achieved: context.achieved,
            status: context.status,
        }
        .into());
    }

    println!("{}", format!("✓ Gate {} passed", gate.name).green());
    println!("  {}", gate.description.dimmed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::error_kind;
    use aether_core::application::build_orchestration::build_orchestration;
    use serde_json::json;

    fn args(bundle: PathBuf, gate: &str, achieved: f64) -> GateArgs {
        GateArgs {
            bundle,
            gate: gate.to_string(),
            required: 0.8,
            achieved,
            status: READY_STATUS.to_string(),
        }
    }

    #[test]
    fn test_gate_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let root = build_orchestration(
            json!({"name": "Gated", "pipeline_stages": [{"key": "search", "agents": ["Scholar"]}]}),
            dir.path(),
            None,
        )
        .unwrap()
        .bundle_root()
        .unwrap()
        .to_path_buf();

        assert!(execute(args(root.clone(), "g_search_complete", 0.9)).is_ok());

        let err = execute(args(root.clone(), "g_search_complete", 0.5)).unwrap_err();
        assert_eq!(error_kind(&err), "GateFailed");

        let err = execute(args(root, "g_unknown", 0.9)).unwrap_err();
        assert_eq!(error_kind(&err), "GateNotFound");
    }
}

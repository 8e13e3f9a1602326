// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Failure reporting at the process boundary
//!
//! Every command returns `anyhow::Result`; the binaries collapse an error into
//! one `error[<Kind>]: <message>` line. The kind comes from the first typed
//! error found in the chain.

use aether_core::application::build_orchestration::BuildError;
use aether_core::application::executor::ExecutorError;
use aether_core::domain::llm::LLMError;
use aether_core::domain::seed::SeedError;
use aether_core::infrastructure::bundle_reader::BundleReadError;
use thiserror::Error;

/// Command outcomes that are failures without an underlying core error.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{failed} of {total} bundle checks failed")]
    VerificationFailed { failed: usize, total: usize },

    #[error("Gate {gate} not satisfied: achieved {achieved} vs required {required}, status '{status}'")]
    GateFailed {
        gate: String,
        required: f64,
        achieved: f64,
        status: String,
    },

    #[error("Gate {gate} not found in bundle {bundle}")]
    GateNotFound { gate: String, bundle: String },
}

impl CommandError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VerificationFailed { .. } => "VerificationFailed",
            Self::GateFailed { .. } => "GateFailed",
            Self::GateNotFound { .. } => "GateNotFound",
        }
    }
}

pub fn error_kind(error: &anyhow::Error) -> &'static str {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<BuildError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<ExecutorError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<BundleReadError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<SeedError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<LLMError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<CommandError>() {
            return e.kind();
        }
    }
    "Error"
}

/// Single-line rendering of a failed command.
pub fn render(error: &anyhow::Error) -> String {
    let message = format!("{:#}", error).replace('\n', " ");
    format!("error[{}]: {}", error_kind(error), message)
}

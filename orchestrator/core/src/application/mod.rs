// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod compiler;
pub mod build_orchestration;
pub mod executor;
pub mod verify;

// Re-export use cases for convenience
pub use build_orchestration::{build_orchestration, compile_seed, BuildError, BuildResult, CompiledSeed};
pub use compiler::{compile, compile_flat, CompiledOrchestration};
pub use executor::{ExecutorError, PipelineExecutor};
pub use verify::{BundleVerifier, CheckResult, VerificationReport};

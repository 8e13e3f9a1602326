// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Aether Forge CLI

pub mod build;
pub mod config;
pub mod gate;
pub mod run;
pub mod validate;
pub mod verify;

pub use self::build::BuildArgs;
pub use self::config::ConfigCommand;
pub use self::gate::GateArgs;
pub use self::run::RunArgs;
pub use self::validate::ValidateArgs;
pub use self::verify::VerifyArgs;

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value objects and documents shared by the compiler and the executor.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Seed, blueprint, graph and bundle document model

pub mod identifiers;
pub mod seed;
pub mod blueprint;
pub mod graph;
pub mod manifest;
pub mod pipeline;
pub mod agent_spec;
pub mod gate;
pub mod policy;
pub mod checks;
pub mod audit;
pub mod llm;
pub mod runner_config;
pub mod path_sanitizer;

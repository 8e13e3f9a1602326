// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Aether Forge Core
//!
//! Compiles declarative multi-stage agent seeds into orchestration bundles
//! and drives an LLM through a bundle in dependency order.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Domain:** seed model, blueprints, graph, bundle documents, policies
//! - **Application:** compiler, build, executor, verifier
//! - **Infrastructure:** seed loader, bundle I/O, templates, LLM adapters

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;

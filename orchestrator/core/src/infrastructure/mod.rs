// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod seed_loader;
pub mod prompt_template_engine;
pub mod bundle_writer;
pub mod bundle_reader;
pub mod llm;

pub use bundle_reader::{BundleReadError, BundleReader, LoadedBundle, SpecRecord};
pub use bundle_writer::{BundleWriteError, BundleWriter};
pub use seed_loader::{SeedLoader, SeedSource};

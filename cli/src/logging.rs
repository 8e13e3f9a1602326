// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tracing subscriber setup shared by both binaries

use anyhow::{Context, Result};
use aether_core::domain::runner_config::{LoggingConfig, RunnerConfigManifest};

/// Logging settings from a configuration load, plus the rendered load failure
/// to report once the subscriber is installed.
pub fn logging_settings(loaded: &Result<RunnerConfigManifest>) -> (LoggingConfig, Option<String>) {
    match loaded {
        Ok(config) => (config.spec.observability.logging.clone(), None),
        Err(error) => (LoggingConfig::default(), Some(format!("{:#}", error))),
    }
}

/// Level precedence: `RUST_LOG`, then the `--log-level` flag, then the
/// configured level.
pub fn init_logging(flag_level: Option<&str>, config: &LoggingConfig) -> Result<()> {
    let level = flag_level.unwrap_or(&config.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_broken_config_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "spec: [not, a, mapping").unwrap();

        let loaded = RunnerConfigManifest::load_or_default(Some(file.path().to_path_buf()));
        let (logging, error) = logging_settings(&loaded);
        assert_eq!(logging.level, LoggingConfig::default().level);
        assert_eq!(logging.format, "compact");
        let error = error.expect("load failure should be surfaced");
        assert!(error.contains("Failed to load config"), "{error}");
    }

    #[test]
    fn test_loaded_config_has_no_error() {
        let mut config = RunnerConfigManifest::default();
        config.spec.observability.logging.format = "json".to_string();
        let (logging, error) = logging_settings(&Ok(config));
        assert_eq!(logging.format, "json");
        assert!(error.is_none());
    }
}

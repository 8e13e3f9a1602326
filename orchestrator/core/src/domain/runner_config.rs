// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Runner Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing:
// - LLM provider selection and credentials
// - Executor defaults (coordinators, agent cap, policy enforcement)
// - Logging settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "aether.dev/v1";
pub const KIND: &str = "RunnerConfig";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Top-level Kubernetes-style runner configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfigManifest {
    /// API version (must be "aether.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "RunnerConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: RunnerConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunnerConfigSpec {
    #[serde(default)]
    pub llm: LLMConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    /// Deterministic local responses, no network.
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request deadline
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl LLMConfig {
    /// Literal key, or the value of `VAR` for `env:VAR`. `None` when unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        let raw = self.api_key.as_deref()?.trim();
        match raw.strip_prefix("env:") {
            Some(var) => std::env::var(var.trim()).ok().filter(|v| !v.is_empty()),
            None if raw.is_empty() => None,
            None => Some(raw.to_string()),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: default_model(),
            endpoint: default_endpoint(),
            api_key: None,
            timeout: default_timeout(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_true")]
    pub include_coordinators: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_agents: Option<usize>,

    #[serde(default)]
    pub enforce_policies: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            include_coordinators: true,
            max_agents: None,
            enforce_policies: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("compact" or "json")
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for RunnerConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "aether-runner".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: RunnerConfigSpec::default(),
        }
    }
}

impl RunnerConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AETHER_CONFIG_PATH environment variable
    /// 2. ./aether-config.yaml (working directory)
    /// 3. ~/.aether/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AETHER_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./aether-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".aether").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails loudly when missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("AETHER_MODEL") {
            if !model.trim().is_empty() {
                tracing::info!("Environment override: AETHER_MODEL={}", model);
                self.spec.llm.model = model.trim().to_string();
            }
        }

        if let Ok(endpoint) = std::env::var("AETHER_LLM_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                tracing::info!("Environment override: AETHER_LLM_ENDPOINT={}", endpoint);
                self.spec.llm.endpoint = endpoint.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let llm = &self.spec.llm;
        if llm.model.trim().is_empty() {
            anyhow::bail!("spec.llm.model cannot be empty");
        }

        if llm.provider == ProviderKind::Gemini && llm.endpoint.trim().is_empty() {
            anyhow::bail!("spec.llm.endpoint cannot be empty for the gemini provider");
        }

        if llm.timeout.is_zero() {
            anyhow::bail!("spec.llm.timeout must be greater than zero");
        }

        if let Some(temperature) = llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                anyhow::bail!("spec.llm.temperature must be within 0.0..=2.0, got {}", temperature);
            }
        }

        match self.spec.observability.logging.format.as_str() {
            "compact" | "json" => {}
            other => anyhow::bail!(
                "Invalid spec.observability.logging.format: '{}'. Expected 'compact' or 'json'",
                other
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = RunnerConfigManifest::default();
        assert_eq!(manifest.api_version, "aether.dev/v1");
        assert_eq!(manifest.kind, "RunnerConfig");
        assert_eq!(manifest.spec.llm.model, "gemini-2.0-flash-exp");
        assert_eq!(manifest.spec.llm.provider, ProviderKind::Gemini);
        assert!(manifest.spec.execution.include_coordinators);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
apiVersion: aether.dev/v1
kind: RunnerConfig
metadata:
  name: lab-runner
spec:
  llm:
    provider: offline
    model: gemini-1.5-pro
    timeout: 45s
  execution:
    include_coordinators: false
    max_agents: 8
  observability:
    logging:
      level: debug
      format: json
"#;
        let manifest = RunnerConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.metadata.name, "lab-runner");
        assert_eq!(manifest.spec.llm.provider, ProviderKind::Offline);
        assert_eq!(manifest.spec.llm.timeout, Duration::from_secs(45));
        assert_eq!(manifest.spec.llm.endpoint, DEFAULT_GEMINI_ENDPOINT);
        assert_eq!(manifest.spec.execution.max_agents, Some(8));
        assert!(!manifest.spec.execution.include_coordinators);
        assert_eq!(manifest.spec.observability.logging.format, "json");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        let mut manifest = RunnerConfigManifest::default();
        manifest.spec.llm.temperature = Some(0.2);
        manifest.to_yaml_file(&path).unwrap();

        let parsed = RunnerConfigManifest::from_yaml_file(&path).unwrap();
        assert_eq!(parsed.spec.llm.temperature, Some(0.2));
        assert_eq!(parsed.spec.llm.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_validation() {
        let mut manifest = RunnerConfigManifest::default();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.llm.model = " ".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.llm.model = DEFAULT_MODEL.to_string();

        manifest.spec.observability.logging.format = "xml".to_string();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_api_key_resolution() {
        let mut llm = LLMConfig::default();
        assert_eq!(llm.resolve_api_key(), None);

        llm.api_key = Some("literal-key".to_string());
        assert_eq!(llm.resolve_api_key().as_deref(), Some("literal-key"));

        llm.api_key = Some("env:AETHER_TEST_UNSET_KEY_VARIABLE".to_string());
        assert_eq!(llm.resolve_api_key(), None);
    }
}

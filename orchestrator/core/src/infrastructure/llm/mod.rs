// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain LLMProvider interface and an
// external API (or none, for the offline provider).

pub mod gemini;
pub mod offline;

pub use gemini::{GeminiAdapter, GeminiConfig};
pub use offline::OfflineProvider;

use crate::domain::llm::{LLMError, LLMProvider};
use crate::domain::runner_config::{LLMConfig, ProviderKind};
use std::sync::Arc;
use tracing::info;

/// Instantiate the provider selected in the runner configuration.
pub fn provider_from_config(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>, LLMError> {
    match config.provider {
        ProviderKind::Gemini => {
            let adapter = GeminiAdapter::new(GeminiConfig::from(config))?;
            info!(model = %config.model, "Using Gemini provider");
            Ok(Arc::new(adapter))
        }
        ProviderKind::Offline => {
            info!("Using offline provider");
            Ok(Arc::new(OfflineProvider::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_selection() {
        let config = LLMConfig {
            provider: ProviderKind::Offline,
            ..Default::default()
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.model(), "offline");
    }

    #[test]
    fn test_gemini_selection_with_explicit_key() {
        let config = LLMConfig {
            api_key: Some("literal-key".to_string()),
            model: "gemini-custom".to_string(),
            ..Default::default()
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.model(), "gemini-custom");
    }
}

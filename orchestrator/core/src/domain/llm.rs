// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Text-generation capability the executor drives agents through.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Provider interface and error taxonomy

// LLM Provider Domain Interface (Anti-Corruption Layer)
//
// The executor only knows this trait. Vendor adapters live in
// infrastructure/llm/.

use async_trait::async_trait;

/// Domain interface for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a stripped, non-empty response for `prompt`, with optional
    /// upstream context appended under a `# Context` heading.
    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String, LLMError>;

    /// Model identifier recorded in audit entries.
    fn model(&self) -> &str;
}

/// The message actually sent to a provider.
pub fn compose_message(prompt: &str, context: Option<&str>) -> String {
    match context {
        Some(context) if !context.is_empty() => format!("{}\n\n# Context\n{}", prompt, context),
        _ => prompt.to_string(),
    }
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Provider blocked the prompt: {0}")]
    Blocked(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Provider error: {0}")]
    Provider(String),
}

impl LLMError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "LLMAuth",
            Self::RateLimit(_) => "LLMRateLimit",
            Self::Timeout(_) => "LLMTimeout",
            Self::Blocked(_) => "ProviderBlocked",
            Self::EmptyResponse => "EmptyResponse",
            Self::Network(_) | Self::Provider(_) => "LLMOther",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_message() {
        assert_eq!(compose_message("Do it", None), "Do it");
        assert_eq!(compose_message("Do it", Some("")), "Do it");
        assert_eq!(
            compose_message("Do it", Some("## Output from a\nx\n")),
            "Do it\n\n# Context\n## Output from a\nx\n"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(LLMError::Authentication("k".into()).kind(), "LLMAuth");
        assert_eq!(LLMError::Blocked("SAFETY".into()).kind(), "ProviderBlocked");
        assert_eq!(LLMError::Network("reset".into()).kind(), "LLMOther");
        assert_eq!(LLMError::EmptyResponse.kind(), "EmptyResponse");
    }
}

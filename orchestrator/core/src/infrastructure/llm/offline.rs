// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Offline LLM Provider
//
// Deterministic responses derived from the prompt heading. Used for dry runs
// of a bundle without credentials or network access.

use crate::domain::llm::{LLMError, LLMProvider};
use async_trait::async_trait;

pub const OFFLINE_MODEL: &str = "offline";

#[derive(Debug, Clone)]
pub struct OfflineProvider {
    model: String,
}

impl OfflineProvider {
    pub fn new() -> Self {
        Self {
            model: OFFLINE_MODEL.to_string(),
        }
    }
}

impl Default for OfflineProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMProvider for OfflineProvider {
    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String, LLMError> {
        let heading = prompt
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| line.trim_start_matches('#').trim())
            .unwrap_or("(empty prompt)");
        let upstream = context
            .map(|c| c.lines().filter(|line| line.starts_with("## Output from ")).count())
            .unwrap_or(0);

        Ok(format!(
            "Offline response for {}\nUpstream outputs: {}",
            heading, upstream
        ))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

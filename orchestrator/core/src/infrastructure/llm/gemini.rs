// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gemini LLM Provider Adapter
//
// Anti-Corruption Layer for Google's Generative Language API
// (`models/{model}:generateContent`). Classifies HTTP and payload failures
// into the domain LLMError taxonomy.

use crate::domain::llm::{compose_message, LLMError, LLMProvider};
use crate::domain::runner_config::{LLMConfig, DEFAULT_GEMINI_ENDPOINT, DEFAULT_MODEL};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];
const INVALID_KEY_MARKER: &str = "API key not valid";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Explicit key; falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            timeout: Duration::from_secs(120),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl From<&LLMConfig> for GeminiConfig {
    fn from(config: &LLMConfig) -> Self {
        Self {
            api_key: config.resolve_api_key(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            timeout: config.timeout,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: String,
    config: GeminiConfig,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiAdapter {
    pub fn new(config: GeminiConfig) -> Result<Self, LLMError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                API_KEY_VARS
                    .iter()
                    .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            })
            .ok_or_else(|| {
                LLMError::Authentication(
                    "no API key configured; set GEMINI_API_KEY or GOOGLE_API_KEY".to_string(),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LLMError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, message: String) -> GenerateRequest {
        let generation_config = if self.config.temperature.is_some()
            || self.config.max_output_tokens.is_some()
        {
            Some(GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            })
        } else {
            None
        };

        GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: message }],
            }],
            generation_config,
        }
    }
}

fn transport_error(error: reqwest::Error) -> LLMError {
    if error.is_timeout() {
        LLMError::Timeout(error.to_string())
    } else {
        LLMError::Network(error.to_string())
    }
}

fn classify_status(status: reqwest::StatusCode, body: &str) -> LLMError {
    match status.as_u16() {
        401 | 403 => LLMError::Authentication(format!("HTTP {}: {}", status, body)),
        429 => LLMError::RateLimit(format!("HTTP {}: {}", status, body)),
        408 | 504 => LLMError::Timeout(format!("HTTP {}", status)),
        _ if body.contains(INVALID_KEY_MARKER) => {
            LLMError::Authentication(INVALID_KEY_MARKER.to_string())
        }
        _ => LLMError::Provider(format!("HTTP {}: {}", status, body)),
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, LLMError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LLMError::Blocked(reason));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(LLMError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    let text = text.trim();

    if text.is_empty() {
        return Err(match candidate.finish_reason.as_deref() {
            Some("SAFETY") => LLMError::Blocked("SAFETY".to_string()),
            _ => LLMError::EmptyResponse,
        });
    }

    Ok(text.to_string())
}

#[async_trait]
impl LLMProvider for GeminiAdapter {
    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String, LLMError> {
        let body = self.request_body(compose_message(prompt, context));

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| LLMError::Provider(format!("Failed to parse response: {}", e)))?;
        let output = extract_text(parsed)?;

        debug!(model = %self.config.model, chars = output.len(), "Gemini response received");
        Ok(output)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/models/gemini-test:generateContent";

    fn adapter(endpoint: String) -> GeminiAdapter {
        GeminiAdapter::new(GeminiConfig {
            api_key: Some("test-key".to_string()),
            model: "gemini-test".to_string(),
            endpoint,
            ..Default::default()
        })
        .unwrap()
    }

    async fn respond(status: usize, body: &str) -> Result<String, LLMError> {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;
        adapter(server.url()).generate("Prompt", Some("ctx")).await
    }

    #[tokio::test]
    async fn test_successful_generation_is_trimmed() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"  Hello "},{"text":"world \n"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(respond(200, body).await.unwrap(), "Hello world");
    }

    #[tokio::test]
    async fn test_status_classification() {
        assert_eq!(respond(401, "{}").await.unwrap_err().kind(), "LLMAuth");
        assert_eq!(respond(429, "{}").await.unwrap_err().kind(), "LLMRateLimit");
        assert_eq!(
            respond(400, r#"{"error":{"message":"API key not valid. Please pass a valid API key."}}"#)
                .await
                .unwrap_err()
                .kind(),
            "LLMAuth"
        );
        assert_eq!(respond(500, "boom").await.unwrap_err().kind(), "LLMOther");
    }

    #[tokio::test]
    async fn test_blocked_and_empty_responses() {
        let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert_eq!(respond(200, blocked).await.unwrap_err().kind(), "ProviderBlocked");

        let safety = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert_eq!(respond(200, safety).await.unwrap_err().kind(), "ProviderBlocked");

        assert_eq!(respond(200, r#"{"candidates":[]}"#).await.unwrap_err().kind(), "EmptyResponse");
        let blank = r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#;
        assert_eq!(respond(200, blank).await.unwrap_err().kind(), "EmptyResponse");
    }

    #[tokio::test]
    async fn test_request_carries_composed_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "Prompt\n\n# Context\nctx"}]}]
            })))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#)
            .create_async()
            .await;

        let result = adapter(server.url()).generate("Prompt", Some("ctx")).await.unwrap();
        assert_eq!(result, "ok");
        mock.assert_async().await;
    }

    #[test]
    fn test_model_identifier() {
        let adapter = adapter("http://localhost".to_string());
        assert_eq!(adapter.model(), "gemini-test");
        assert_eq!(adapter.url(), "http://localhost/models/gemini-test:generateContent");
    }
}

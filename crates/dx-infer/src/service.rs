//! Language-inference service boundary
//!
//! The service is a stateless text-completion function: a system message and
//! a prompt go in, free text comes out. Prompt construction and response
//! checking live in the adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dx_core::InferenceConfig;
use serde::Deserialize;

use crate::error::{InferenceError, InferenceResult};

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text completion backend
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Model or backend name used in logs
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> InferenceResult<String>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleService {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl OpenAiCompatibleService {
    pub fn new(config: &InferenceConfig, api_key: String) -> InferenceResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Service(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            InferenceError::Network(err.to_string())
        }
    }

    async fn send(&self, request: &CompletionRequest) -> InferenceResult<String> {
        let body = serde_json::json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": &request.system},
                {"role": "user", "content": &request.prompt}
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = format!("{}: {}", status, truncate(&text, 200));
            return Err(match status.as_u16() {
                401 | 403 => InferenceError::Authentication(detail),
                429 => InferenceError::RateLimit(detail),
                408 => InferenceError::Timeout {
                    secs: self.timeout.as_secs(),
                },
                500..=599 => InferenceError::Network(detail),
                _ => InferenceError::Service(detail),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e)
            } else {
                InferenceError::InvalidResponse {
                    reason: format!("malformed completion payload: {}", e),
                }
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| InferenceError::InvalidResponse {
                reason: "service returned no content".to_string(),
            })
    }
}

#[async_trait]
impl InferenceService for OpenAiCompatibleService {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> InferenceResult<String> {
        log::debug!(
            "Calling {} at {} ({} prompt chars)",
            self.model,
            self.endpoint,
            request.prompt.len()
        );
        match tokio::time::timeout(self.timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

/// Stand-in used when no API key is configured; every call fails critically.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredService;

#[async_trait]
impl InferenceService for UnconfiguredService {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn complete(&self, _request: &CompletionRequest) -> InferenceResult<String> {
        Err(InferenceError::Authentication(format!(
            "no API key configured; set inference.api_key or {}",
            dx_core::config::API_KEY_ENV
        )))
    }
}

/// The HTTP client when a key is available, otherwise [`UnconfiguredService`]
pub fn service_from_config(
    config: &InferenceConfig,
    api_key_override: Option<&str>,
) -> InferenceResult<Arc<dyn InferenceService>> {
    let key = api_key_override
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| config.resolved_api_key());
    match key {
        Some(key) => Ok(Arc::new(OpenAiCompatibleService::new(config, key)?)),
        None => {
            log::debug!("No inference API key configured; generative conversion is disabled");
            Ok(Arc::new(UnconfiguredService))
        }
    }
}

/// First `max` characters of `text`, marked when cut
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;

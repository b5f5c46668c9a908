//! Generative conversion: cache, prompt, call, clean, validate

use std::sync::Arc;

use dx_core::{Config, Dialect};
use tokio_util::sync::CancellationToken;

use crate::cache::ConversionCache;
use crate::error::{InferenceError, InferenceResult};
use crate::prompt::{select_prompt, PromptContext, PromptKind, PromptLibrary, SYSTEM_MESSAGE};
use crate::response::{clean_response, validate_response};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::service::{CompletionRequest, InferenceService};

/// A unit of SQL to convert generatively
#[derive(Debug, Clone, Copy)]
pub struct GenerativeRequest<'a> {
    pub sql: &'a str,
    pub source: Dialect,
    pub target: Dialect,
    pub complexity: u8,
}

/// Accepted generative output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerativeOutput {
    pub text: String,
    /// Template that produced `text`; `None` for cache hits
    pub prompt: Option<PromptKind>,
    pub cache_hit: bool,
    /// The first response was rejected and the basic prompt was used
    pub used_fallback_prompt: bool,
}

/// Drives the inference service for one conversion at a time
pub struct GenerativeAdapter {
    service: Arc<dyn InferenceService>,
    prompts: PromptLibrary,
    cache: Arc<ConversionCache>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    temperature: f32,
    max_tokens: u32,
    max_length_ratio: f64,
    wrappers: Vec<String>,
}

impl GenerativeAdapter {
    pub fn new(
        config: &Config,
        service: Arc<dyn InferenceService>,
        cache: Arc<ConversionCache>,
    ) -> InferenceResult<Self> {
        Ok(Self {
            service,
            prompts: PromptLibrary::new()?,
            cache,
            retry: RetryPolicy::from_config(&config.inference.retry),
            sleeper: Arc::new(TokioSleeper),
            temperature: config.inference.temperature,
            max_tokens: config.inference.max_tokens,
            max_length_ratio: config.inference.max_length_ratio,
            wrappers: config.conversion.dynamic_wrappers.clone(),
        })
    }

    /// Replace the backoff sleeper
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub fn cache(&self) -> &Arc<ConversionCache> {
        &self.cache
    }

    /// Convert one unit, consulting the cache first.
    ///
    /// A rejected response is retried once with the basic prompt before the
    /// rejection is surfaced.
    pub async fn convert(
        &self,
        request: &GenerativeRequest<'_>,
        cancel: &CancellationToken,
    ) -> InferenceResult<GenerativeOutput> {
        if let Some(text) = self.cache.get(request.source, request.target, request.sql) {
            return Ok(GenerativeOutput {
                text,
                prompt: None,
                cache_hit: true,
                used_fallback_prompt: false,
            });
        }

        let ctx = PromptContext {
            sql: request.sql,
            source: request.source,
            target: request.target,
            wrappers: &self.wrappers,
            error_message: None,
        };
        let kind = select_prompt(
            request.sql,
            request.source,
            request.target,
            request.complexity,
            &self.wrappers,
        );

        let first = self.generate(kind, &ctx, cancel).await?;
        let (text, prompt, used_fallback_prompt) =
            match validate_response(&first, request.sql, self.max_length_ratio) {
                Ok(()) => (first, kind, false),
                Err(reason) => {
                    log::warn!(
                        "Rejected {} response ({}), retrying with {}",
                        kind,
                        reason,
                        PromptKind::BasicConversion
                    );
                    let second = self
                        .generate(PromptKind::BasicConversion, &ctx, cancel)
                        .await?;
                    validate_response(&second, request.sql, self.max_length_ratio)
                        .map_err(|reason| InferenceError::InvalidResponse { reason })?;
                    (second, PromptKind::BasicConversion, true)
                }
            };

        self.cache
            .put(request.source, request.target, request.sql, &text);
        Ok(GenerativeOutput {
            text,
            prompt: Some(prompt),
            cache_hit: false,
            used_fallback_prompt,
        })
    }

    /// Convert a whole document with the error-recovery prompt
    pub async fn recover(
        &self,
        sql: &str,
        source: Dialect,
        target: Dialect,
        error_message: &str,
        cancel: &CancellationToken,
    ) -> InferenceResult<GenerativeOutput> {
        let ctx = PromptContext {
            sql,
            source,
            target,
            wrappers: &self.wrappers,
            error_message: Some(error_message),
        };
        let text = self
            .generate(PromptKind::ErrorRecovery, &ctx, cancel)
            .await?;
        validate_response(&text, sql, self.max_length_ratio)
            .map_err(|reason| InferenceError::InvalidResponse { reason })?;
        Ok(GenerativeOutput {
            text,
            prompt: Some(PromptKind::ErrorRecovery),
            cache_hit: false,
            used_fallback_prompt: false,
        })
    }

    /// Render, call with retry and clean
    async fn generate(
        &self,
        kind: PromptKind,
        ctx: &PromptContext<'_>,
        cancel: &CancellationToken,
    ) -> InferenceResult<String> {
        let request = CompletionRequest {
            system: SYSTEM_MESSAGE.to_string(),
            prompt: self.prompts.render(kind, ctx)?,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        log::debug!(
            "Generating with {} prompt via {} ({} chars)",
            kind,
            self.service.name(),
            request.prompt.len()
        );
        let raw = self
            .retry
            .run(self.sleeper.as_ref(), cancel, |_| {
                self.service.complete(&request)
            })
            .await?;
        Ok(clean_response(&raw))
    }
}

#[cfg(test)]
#[path = "adapter_test.rs"]
mod tests;

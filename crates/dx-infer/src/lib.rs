//! dx-infer - Generative SQL conversion for Dialectic
//!
//! This crate provides the inference service boundary and its HTTP client,
//! the prompt template library, response cleaning and validation, retry with
//! backoff, and the generative result cache.

pub mod adapter;
pub mod cache;
pub mod clock;
pub mod error;
pub mod prompt;
pub mod response;
pub mod retry;
pub mod service;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use adapter::{GenerativeAdapter, GenerativeOutput, GenerativeRequest};
pub use cache::ConversionCache;
pub use clock::{Clock, SystemClock};
pub use error::{InferenceError, InferenceErrorKind, InferenceResult};
pub use prompt::{select_prompt, PromptContext, PromptKind, PromptLibrary};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use service::{
    service_from_config, CompletionRequest, InferenceService, OpenAiCompatibleService,
    UnconfiguredService,
};

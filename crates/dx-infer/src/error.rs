//! Error types for dx-infer

use thiserror::Error;

/// Inference service and generative adapter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// Request exceeded the configured timeout (I001)
    #[error("[I001] Inference request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection or transport failure, including 5xx responses (I002)
    #[error("[I002] Network error contacting inference service: {0}")]
    Network(String),

    /// Service asked us to slow down (I003)
    #[error("[I003] Inference service rate limit exceeded: {0}")]
    RateLimit(String),

    /// Missing or rejected credentials (I004)
    #[error("[I004] Inference service authentication failed: {0}")]
    Authentication(String),

    /// Response failed cleaning or validation (I005)
    #[error("[I005] Inference response rejected: {reason}")]
    InvalidResponse { reason: String },

    /// Caller gave up before the request finished (I006)
    #[error("[I006] Inference request cancelled")]
    Cancelled,

    /// Prompt template failed to render (I007)
    #[error("[I007] Prompt template error: {0}")]
    Template(String),

    /// Any other service failure (I008)
    #[error("[I008] Inference service error: {0}")]
    Service(String),
}

/// Coarse classification used by retry and error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferenceErrorKind {
    Timeout,
    Network,
    RateLimit,
    Authentication,
    InvalidResponse,
    Cancelled,
    Other,
}

impl InferenceError {
    pub fn kind(&self) -> InferenceErrorKind {
        match self {
            InferenceError::Timeout { .. } => InferenceErrorKind::Timeout,
            InferenceError::Network(_) => InferenceErrorKind::Network,
            InferenceError::RateLimit(_) => InferenceErrorKind::RateLimit,
            InferenceError::Authentication(_) => InferenceErrorKind::Authentication,
            InferenceError::InvalidResponse { .. } => InferenceErrorKind::InvalidResponse,
            InferenceError::Cancelled => InferenceErrorKind::Cancelled,
            InferenceError::Template(_) | InferenceError::Service(_) => InferenceErrorKind::Other,
        }
    }

    /// Transient failures worth another attempt after backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            InferenceErrorKind::Timeout
                | InferenceErrorKind::Network
                | InferenceErrorKind::RateLimit
        )
    }

    /// Failures that no repeat attempt can fix
    pub fn is_critical(&self) -> bool {
        matches!(self.kind(), InferenceErrorKind::Authentication)
    }
}

impl From<minijinja::Error> for InferenceError {
    fn from(err: minijinja::Error) -> Self {
        InferenceError::Template(err.to_string())
    }
}

/// Result type alias for InferenceError
pub type InferenceResult<T> = Result<T, InferenceError>;

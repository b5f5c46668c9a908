//! Error types for dx-engine

use dx_core::CoreError;
use dx_infer::{InferenceError, InferenceErrorKind};
use dx_sql::SqlError;
use serde::Serialize;
use thiserror::Error;

/// Document conversion failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Bad input or dialect; nothing was converted (X001)
    #[error("[X001] Invalid conversion request: {message}")]
    Validation { message: String },

    /// The rule-based engine rejected the text (X002)
    #[error("[X002] {0}")]
    ParseFailure(SqlError),

    /// The rule-based engine cannot express a construct in the target (X003)
    #[error("[X003] {0}")]
    UnsupportedFeature(SqlError),

    /// Any other rule-based engine failure (X004)
    #[error("[X004] {0}")]
    Engine(SqlError),

    /// The inference service or its response failed (X005)
    #[error("[X005] {0}")]
    Inference(InferenceError),

    /// Reassembly produced structurally invalid output (X006)
    #[error("[X006] Output assembly failed: {message}")]
    Assembly { message: String },

    /// The caller cancelled the conversion (X007)
    #[error("[X007] Conversion cancelled")]
    Cancelled,
}

impl ConvertError {
    pub fn validation(message: impl Into<String>) -> Self {
        ConvertError::Validation {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ConvertError::Validation { .. } => "X001",
            ConvertError::ParseFailure(_) => "X002",
            ConvertError::UnsupportedFeature(_) => "X003",
            ConvertError::Engine(_) => "X004",
            ConvertError::Inference(_) => "X005",
            ConvertError::Assembly { .. } => "X006",
            ConvertError::Cancelled => "X007",
        }
    }

    /// Human-readable category shown to operators
    pub fn category(&self) -> &'static str {
        match self {
            ConvertError::Validation { .. } => "Validation",
            ConvertError::ParseFailure(_) => "Parse failure",
            ConvertError::UnsupportedFeature(_) => "Unsupported feature",
            ConvertError::Engine(_) => "Rule-based engine",
            ConvertError::Inference(err) => match err.kind() {
                InferenceErrorKind::Timeout => "Inference timeout",
                InferenceErrorKind::Network => "Inference network",
                InferenceErrorKind::RateLimit => "Inference rate limit",
                InferenceErrorKind::Authentication => "Inference authentication",
                InferenceErrorKind::InvalidResponse => "Inference response",
                InferenceErrorKind::Cancelled => "Cancelled",
                InferenceErrorKind::Other => "Inference service",
            },
            ConvertError::Assembly { .. } => "Assembly",
            ConvertError::Cancelled => "Cancelled",
        }
    }

    /// Configuration or credential failures; repeating the attempt cannot help
    pub fn is_critical(&self) -> bool {
        matches!(self, ConvertError::Inference(err) if err.is_critical())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConvertError::Cancelled)
    }

    /// Whether the error-recovery prompt may be tried after this error
    pub fn is_recoverable(&self) -> bool {
        !(self.is_critical()
            || self.is_cancelled()
            || matches!(self, ConvertError::Validation { .. }))
    }

    pub fn record(&self) -> ErrorRecord {
        ErrorRecord {
            category: self.category().to_string(),
            code: self.code().to_string(),
            message: self.to_string(),
            critical: self.is_critical(),
        }
    }
}

impl From<SqlError> for ConvertError {
    fn from(err: SqlError) -> Self {
        match err {
            SqlError::ParseFailure { .. } | SqlError::EmptySql => ConvertError::ParseFailure(err),
            SqlError::UnsupportedFeature { .. } => ConvertError::UnsupportedFeature(err),
            SqlError::Other(_) => ConvertError::Engine(err),
        }
    }
}

impl From<InferenceError> for ConvertError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Cancelled => ConvertError::Cancelled,
            other => ConvertError::Inference(other),
        }
    }
}

impl From<CoreError> for ConvertError {
    fn from(err: CoreError) -> Self {
        ConvertError::Validation {
            message: err.to_string(),
        }
    }
}

/// Serialisable snapshot of a [`ConvertError`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub category: String,
    pub code: String,
    pub message: String,
    pub critical: bool,
}

/// Result type alias for ConvertError
pub type ConvertResult<T> = Result<T, ConvertError>;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

//! Error types for dx-sql

use thiserror::Error;

/// Rule-based engine failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    /// The source text does not parse in the source dialect (S001)
    #[error("[S001] SQL parse error at line {line}, column {column}: {message}")]
    ParseFailure {
        message: String,
        line: usize,
        column: usize,
    },

    /// Empty SQL (S002)
    #[error("[S002] SQL is empty")]
    EmptySql,

    /// Parsed, but the target dialect cannot express a construct (S003)
    #[error("[S003] {feature} is not supported when converting {from} to {to}")]
    UnsupportedFeature {
        feature: String,
        from: String,
        to: String,
    },

    /// Any other engine failure (S004)
    #[error("[S004] Rule-based conversion failed: {0}")]
    Other(String),
}

impl SqlError {
    /// Only parse failures justify a silent switch to the generative path
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, SqlError::ParseFailure { .. } | SqlError::EmptySql)
    }
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;

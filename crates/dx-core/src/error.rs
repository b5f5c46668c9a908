//! Error types for dx-core

use thiserror::Error;

/// Core error type for Dialectic
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Dialect name is not in the supported set
    #[error("[C003] Unsupported dialect '{name}'. Run `dx dialects` for the supported list")]
    UnsupportedDialect { name: String },

    /// C004: IO error with file path context
    #[error("[C004] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C005: YAML parse error
    #[error("[C005] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// C006: A configured dynamic wrapper name cannot be used in a pattern
    #[error("[C006] Invalid dynamic wrapper name '{name}': must be an identifier")]
    InvalidWrapperName { name: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

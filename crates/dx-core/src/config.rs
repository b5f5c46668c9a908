//! Configuration types and parsing for dialectic.yml

use crate::dialect::DialectPair;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable consulted when `inference.api_key` is empty
pub const API_KEY_ENV: &str = "DIALECTIC_API_KEY";

/// Highest value the complexity analyzer can produce
pub const MAX_COMPLEXITY: u8 = 10;

/// Top-level configuration from dialectic.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Document conversion behaviour
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Strategy selection thresholds
    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Inference service connection and response limits
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Generative result cache
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Document conversion behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    /// Pretty-print rule-based output
    #[serde(default = "default_true")]
    pub pretty_print: bool,

    /// Retry a failed document once with the error-recovery prompt
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,

    /// Units of one document converted concurrently
    #[serde(default = "default_max_concurrent_units")]
    pub max_concurrent_units: usize,

    /// Function names whose single string argument is SQL to convert
    #[serde(default = "default_dynamic_wrappers")]
    pub dynamic_wrappers: Vec<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            pretty_print: true,
            fallback_enabled: true,
            max_concurrent_units: default_max_concurrent_units(),
            dynamic_wrappers: default_dynamic_wrappers(),
        }
    }
}

/// Strategy selection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    /// Complexity at or below which units are converted rule-based
    #[serde(default = "default_rule_based_max")]
    pub rule_based_max: u8,

    /// Complexity at or below which units use the hybrid strategy
    #[serde(default = "default_hybrid_max")]
    pub hybrid_max: u8,

    /// Explicit hard pairs. `None` derives them from dialect profiles.
    #[serde(default)]
    pub hard_pairs: Option<Vec<DialectPair>>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            rule_based_max: default_rule_based_max(),
            hybrid_max: default_hybrid_max(),
            hard_pairs: None,
        }
    }
}

/// Inference service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InferenceConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key; falls back to `DIALECTIC_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cleaned responses longer than this multiple of the input are rejected
    #[serde(default = "default_max_length_ratio")]
    pub max_length_ratio: f64,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_length_ratio: default_max_length_ratio(),
            retry: RetryConfig::default(),
        }
    }
}

impl InferenceConfig {
    /// The configured key, or the environment fallback. `None` when neither is set.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        std::env::var(API_KEY_ENV)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

/// Exponential backoff settings for inference calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

/// Generative result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry lifetime in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Size bound; the oldest-created entry is evicted past it
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_units() -> usize {
    4
}

fn default_dynamic_wrappers() -> Vec<String> {
    vec!["ZTC_SQLZZ".to_string()]
}

fn default_rule_based_max() -> u8 {
    3
}

fn default_hybrid_max() -> u8 {
    6
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_length_ratio() -> f64 {
    5.0
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_max_entries() -> usize {
    1000
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.into(),
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        // An empty file deserializes to unit, not an empty mapping
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory.
    /// Looks for dialectic.yml or dialectic.yaml, falling back to defaults.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("dialectic.yml");
        let yaml_path = dir.join("dialectic.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            log::debug!(
                "No dialectic.yml in {}, using default configuration",
                dir.display()
            );
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        let strategy = &self.strategy;
        if strategy.rule_based_max > strategy.hybrid_max {
            return Err(invalid(format!(
                "strategy.rule_based_max ({}) must not exceed strategy.hybrid_max ({})",
                strategy.rule_based_max, strategy.hybrid_max
            )));
        }
        if strategy.hybrid_max > MAX_COMPLEXITY {
            return Err(invalid(format!(
                "strategy.hybrid_max ({}) must be at most {}",
                strategy.hybrid_max, MAX_COMPLEXITY
            )));
        }

        if self.conversion.max_concurrent_units == 0 {
            return Err(invalid("conversion.max_concurrent_units must be at least 1"));
        }
        for name in &self.conversion.dynamic_wrappers {
            if !is_identifier(name) {
                return Err(CoreError::InvalidWrapperName { name: name.clone() });
            }
        }

        let inference = &self.inference;
        if !(0.0..=2.0).contains(&inference.temperature) {
            return Err(invalid(format!(
                "inference.temperature ({}) must be between 0 and 2",
                inference.temperature
            )));
        }
        if inference.timeout_secs == 0 {
            return Err(invalid("inference.timeout_secs must be at least 1"));
        }
        if inference.max_length_ratio <= 0.0 {
            return Err(invalid("inference.max_length_ratio must be positive"));
        }
        if inference.retry.max_attempts == 0 {
            return Err(invalid("inference.retry.max_attempts must be at least 1"));
        }
        if inference.retry.multiplier < 1.0 {
            return Err(invalid("inference.retry.multiplier must be at least 1.0"));
        }

        if self.cache.max_entries == 0 {
            return Err(invalid("cache.max_entries must be at least 1"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs must be at least 1"));
        }

        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

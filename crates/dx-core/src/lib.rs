//! dx-core - Core library for Dialectic
//!
//! This crate provides the dialect set, configuration parsing, SQL lexical
//! masking, region matching, complexity scoring and strategy selection used
//! by the conversion engine and the CLI.

pub mod checksum;
pub mod complexity;
pub mod config;
pub mod dialect;
pub mod error;
pub mod lexer;
pub mod region;
pub mod segment;
pub mod strategy;

pub use checksum::{conversion_key, normalize_sql_text};
pub use complexity::{ComplexityAnalyzer, ComplexityReport};
pub use config::{
    CacheConfig, Config, ConversionConfig, InferenceConfig, RetryConfig, StrategyConfig,
    MAX_COMPLEXITY,
};
pub use dialect::{Dialect, DialectPair, ProceduralLanguage};
pub use error::{CoreError, CoreResult};
pub use lexer::{LexicalMask, MaskKind};
pub use region::{Region, RegionKind};
pub use segment::{DynamicCall, Piece, RegionMatcher, Segmentation};
pub use strategy::{Strategy, StrategySelector};

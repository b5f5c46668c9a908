//! dx-sql - Rule-based SQL transpilation for Dialectic
//!
//! This crate provides the deterministic conversion engine: sqlparser
//! grammars per dialect, AST rewrite rules, unsupported-feature detection,
//! the structural Oracle procedure rewrite and advisory result validation.

pub mod dialect;
pub mod engine;
pub mod error;
pub mod procedure;
pub mod rewrite;
pub mod validator;

pub use dialect::{parse, parser_dialect};
pub use engine::{RuleEngine, SqlparserEngine};
pub use error::{SqlError, SqlResult};
pub use procedure::{supports_structural_rewrite, OracleProcedure};
pub use validator::validate_result;

//! dx-engine - Conversion Coordinator for Dialectic
//!
//! Turns a SQL document in one dialect into the same document in another:
//! segmentation into typed regions, per-unit strategy dispatch between the
//! rule-based engine and the generative adapter, reassembly, validation,
//! error recovery and process-wide statistics.

pub mod coordinator;
pub mod error;
pub mod preprocess;
pub mod result;
pub mod stats;

pub use coordinator::{Coordinator, RECOVERED_WARNING};
pub use error::{ConvertError, ConvertResult, ErrorRecord};
pub use result::{ConversionMetadata, ConversionResult, UnitOutcome, UnitReport};
pub use stats::{ConversionStats, StatsSnapshot};

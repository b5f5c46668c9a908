//! Conversion result model

use chrono::{DateTime, Utc};
use dx_core::{Dialect, RegionKind, Strategy};
use dx_infer::PromptKind;
use serde::Serialize;
use std::fmt;
use std::ops::Range;

use crate::error::{ConvertError, ErrorRecord};

/// How a single unit was actually converted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnitOutcome {
    #[serde(rename = "rule_based")]
    RuleBased,
    #[serde(rename = "generative")]
    Generative,
    #[serde(rename = "hybrid_ruleBased_success")]
    HybridRuleBasedSuccess,
    #[serde(rename = "hybrid_generative_fallback")]
    HybridGenerativeFallback,
    /// Rule-based parse failure retried generatively
    #[serde(rename = "rule_based_generative_retry")]
    RuleBasedGenerativeRetry,
    /// Procedure re-emitted in the target's procedural language
    #[serde(rename = "structural_rewrite")]
    StructuralRewrite,
    /// Nothing in the unit needed conversion
    #[serde(rename = "passthrough")]
    Passthrough,
}

impl UnitOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitOutcome::RuleBased => "rule_based",
            UnitOutcome::Generative => "generative",
            UnitOutcome::HybridRuleBasedSuccess => "hybrid_ruleBased_success",
            UnitOutcome::HybridGenerativeFallback => "hybrid_generative_fallback",
            UnitOutcome::RuleBasedGenerativeRetry => "rule_based_generative_retry",
            UnitOutcome::StructuralRewrite => "structural_rewrite",
            UnitOutcome::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-unit dispatch record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    /// Position among the document's units
    pub index: usize,
    pub kind: RegionKind,
    /// Byte span in the preprocessed text the unit came from
    pub span: Range<usize>,
    pub complexity: u8,
    /// Strategy the unit was finally converted with
    pub strategy: Strategy,
    pub outcome: UnitOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptKind>,
    pub cache_hit: bool,
    pub duration_ms: u64,
}

/// Everything known about a conversion besides its text
#[derive(Debug, Clone, Serialize)]
pub struct ConversionMetadata {
    pub conversion_id: String,
    pub started_at: DateTime<Utc>,
    pub source: Option<Dialect>,
    pub target: Option<Dialect>,
    /// Document-level complexity score
    pub complexity: u8,
    pub duration_ms: u64,
    /// At least one unit was served from the cache
    pub cache_hit: bool,
    pub error_recovered: bool,
    /// The document was converted as a single procedural block
    pub whole_document: bool,
    pub units: Vec<UnitReport>,
}

impl ConversionMetadata {
    pub(crate) fn new(conversion_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            conversion_id,
            started_at,
            source: None,
            target: None,
            complexity: 0,
            duration_ms: 0,
            cache_hit: false,
            error_recovered: false,
            whole_document: false,
            units: Vec::new(),
        }
    }
}

/// Outcome of one document conversion, owned by the caller
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub success: bool,
    /// Converted text; empty on failure
    pub result_text: String,
    pub strategy: Strategy,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    pub metadata: ConversionMetadata,
}

impl ConversionResult {
    pub(crate) fn succeeded(
        result_text: String,
        strategy: Strategy,
        warnings: Vec<String>,
        metadata: ConversionMetadata,
    ) -> Self {
        Self {
            success: true,
            result_text,
            strategy,
            warnings,
            error: None,
            metadata,
        }
    }

    pub(crate) fn failed(
        err: &ConvertError,
        strategy: Strategy,
        warnings: Vec<String>,
        metadata: ConversionMetadata,
    ) -> Self {
        Self {
            success: false,
            result_text: String::new(),
            strategy,
            warnings,
            error: Some(err.record()),
            metadata,
        }
    }

    /// Error category, when the conversion failed
    pub fn error_category(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.category.as_str())
    }

    /// Units converted with the given outcome
    pub fn units_with(&self, outcome: UnitOutcome) -> impl Iterator<Item = &UnitReport> {
        self.metadata
            .units
            .iter()
            .filter(move |u| u.outcome == outcome)
    }
}

/// Most inferential strategy among the units; rule-based when there are none
pub fn document_strategy(units: &[UnitReport]) -> Strategy {
    units
        .iter()
        .map(|u| u.strategy)
        .max_by_key(|s| s.rank())
        .unwrap_or(Strategy::RuleBased)
}

#[cfg(test)]
#[path = "result_test.rs"]
mod tests;

//! Structural complexity scoring
//!
//! Scores are additive and clamped to `0..=MAX_COMPLEXITY`. Keyword signals
//! are read from code tokens only, so literals and comments never add to a
//! score. Scoring is a pure function of the text and the wrapper set.

use crate::config::MAX_COMPLEXITY;
use crate::lexer::{LexicalMask, MaskKind, Token};
use crate::segment::{procedural_candidates, RegionMatcher};
use serde::Serialize;

const PROCEDURAL_WEIGHT: u8 = 5;
const DYNAMIC_CALL_WEIGHT: u8 = 3;
const JOIN_WEIGHT: u8 = 2;
const JOIN_THRESHOLD: usize = 2;
const SELECT_THRESHOLD: usize = 1;
const LONG_LINES: usize = 20;
const VERY_LONG_LINES: usize = 50;

/// Signals that contributed to a score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComplexityReport {
    pub score: u8,
    pub has_procedural: bool,
    pub has_dynamic_call: bool,
    pub has_window_function: bool,
    pub has_recursive_cte: bool,
    pub has_hierarchical_query: bool,
    pub has_comments: bool,
    pub join_count: usize,
    pub select_count: usize,
    pub line_count: usize,
}

/// Computes complexity scores for SQL text
#[derive(Debug, Clone)]
pub struct ComplexityAnalyzer {
    matcher: RegionMatcher,
}

impl ComplexityAnalyzer {
    pub fn new(matcher: RegionMatcher) -> Self {
        Self { matcher }
    }

    /// Score only
    pub fn score(&self, text: &str) -> u8 {
        self.analyze(text).score
    }

    /// Score with the signals behind it
    pub fn analyze(&self, text: &str) -> ComplexityReport {
        let mask = LexicalMask::scan(text);
        let tokens = mask.tokens(text);

        let mut report = ComplexityReport {
            has_procedural: !procedural_candidates(text, &mask).is_empty(),
            has_dynamic_call: self.matcher.has_dynamic_call(text, &mask),
            has_window_function: has_window_function(text, &tokens),
            has_recursive_cte: followed_by(text, &tokens, "WITH", "RECURSIVE"),
            has_hierarchical_query: followed_by(text, &tokens, "CONNECT", "BY"),
            has_comments: mask
                .spans()
                .iter()
                .any(|s| matches!(s.kind, MaskKind::LineComment | MaskKind::BlockComment)),
            join_count: count_keyword(text, &tokens, "JOIN"),
            select_count: count_keyword(text, &tokens, "SELECT"),
            line_count: text.split('\n').count(),
            score: 0,
        };

        let mut score: u32 = 0;
        if report.has_procedural {
            score += u32::from(PROCEDURAL_WEIGHT);
        }
        if report.has_dynamic_call {
            score += u32::from(DYNAMIC_CALL_WEIGHT);
        }
        score += [
            report.has_window_function,
            report.has_recursive_cte,
            report.has_hierarchical_query,
        ]
        .iter()
        .filter(|present| **present)
        .count() as u32;
        if report.join_count > JOIN_THRESHOLD {
            score += u32::from(JOIN_WEIGHT);
        }
        if report.select_count > SELECT_THRESHOLD {
            score += 1;
        }
        if report.line_count > VERY_LONG_LINES {
            score += 2;
        } else if report.line_count > LONG_LINES {
            score += 1;
        }

        report.score = score.min(u32::from(MAX_COMPLEXITY)) as u8;
        report
    }
}

fn count_keyword(text: &str, tokens: &[Token], keyword: &str) -> usize {
    tokens.iter().filter(|t| t.is_keyword(text, keyword)).count()
}

fn followed_by(text: &str, tokens: &[Token], first: &str, second: &str) -> bool {
    tokens
        .windows(2)
        .any(|w| w[0].is_keyword(text, first) && w[1].is_keyword(text, second))
}

/// `OVER (` following an aggregate or analytic call
fn has_window_function(text: &str, tokens: &[Token]) -> bool {
    tokens
        .iter()
        .any(|t| t.is_keyword(text, "OVER") && text[t.end..].trim_start().starts_with('('))
}

#[cfg(test)]
#[path = "complexity_test.rs"]
mod tests;

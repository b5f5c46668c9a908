//! Conversion strategy selection

use crate::config::{Config, StrategyConfig};
use crate::dialect::{Dialect, DialectPair};
use serde::Serialize;
use std::fmt;

/// How a unit is converted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Deterministic transpilation only
    RuleBased,
    /// Rule-based first, generative on failure
    Hybrid,
    /// Language-inference service
    Generative,
}

impl Strategy {
    /// Ordering by how much a strategy relies on inference
    pub fn rank(self) -> u8 {
        match self {
            Strategy::RuleBased => 0,
            Strategy::Hybrid => 1,
            Strategy::Generative => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::RuleBased => "rule_based",
            Strategy::Hybrid => "hybrid",
            Strategy::Generative => "generative",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps dialect pair, complexity and content kind to a strategy
#[derive(Debug, Clone)]
pub struct StrategySelector {
    rule_based_max: u8,
    hybrid_max: u8,
    hard_pairs: Option<Vec<DialectPair>>,
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new(&StrategyConfig::default())
    }
}

impl StrategySelector {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            rule_based_max: config.rule_based_max,
            hybrid_max: config.hybrid_max,
            hard_pairs: config.hard_pairs.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.strategy)
    }

    /// Whether procedural content cannot be trusted to the rule-based path
    pub fn is_hard_pair(&self, source: Dialect, target: Dialect) -> bool {
        match &self.hard_pairs {
            Some(pairs) => pairs.contains(&DialectPair::new(source, target)),
            None => target.lacks_procedural_features_of(source),
        }
    }

    pub fn select(
        &self,
        source: Dialect,
        target: Dialect,
        complexity: u8,
        has_procedural_content: bool,
    ) -> Strategy {
        let strategy = if has_procedural_content && self.is_hard_pair(source, target) {
            Strategy::Generative
        } else if complexity <= self.rule_based_max {
            Strategy::RuleBased
        } else if complexity <= self.hybrid_max {
            Strategy::Hybrid
        } else {
            Strategy::Generative
        };
        log::debug!(
            "Strategy {} for {}->{} (complexity {}, procedural: {})",
            strategy,
            source,
            target,
            complexity,
            has_procedural_content
        );
        strategy
    }
}

#[cfg(test)]
#[path = "strategy_test.rs"]
mod tests;

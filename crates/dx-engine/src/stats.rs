//! Process-wide conversion statistics

use dx_core::Strategy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::result::ConversionResult;

/// Lock-free counters shared by every conversion of a coordinator
#[derive(Debug, Default)]
pub struct ConversionStats {
    total: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    rule_based: AtomicU64,
    hybrid: AtomicU64,
    generative: AtomicU64,
    error_recoveries: AtomicU64,
    cache_hits: AtomicU64,
    total_duration_ms: AtomicU64,
}

/// Point-in-time view of [`ConversionStats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rule_based: u64,
    pub hybrid: u64,
    pub generative: u64,
    pub error_recoveries: u64,
    pub cache_hits: u64,
    pub average_duration_ms: f64,
    pub success_rate: f64,
    pub rule_based_rate: f64,
    pub hybrid_rate: f64,
    pub generative_rate: f64,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished conversion.
    ///
    /// The strategy is counted only when units were dispatched; rejected
    /// requests count as failures and nothing else.
    pub fn record(&self, result: &ConversionResult) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if result.success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        let metadata = &result.metadata;
        if !metadata.units.is_empty() || metadata.error_recovered {
            let counter = match result.strategy {
                Strategy::RuleBased => &self.rule_based,
                Strategy::Hybrid => &self.hybrid,
                Strategy::Generative => &self.generative,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        if metadata.error_recovered {
            self.error_recoveries.fetch_add(1, Ordering::Relaxed);
        }
        let hits = metadata.units.iter().filter(|u| u.cache_hit).count() as u64;
        self.cache_hits.fetch_add(hits, Ordering::Relaxed);
        self.total_duration_ms
            .fetch_add(metadata.duration_ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let rule_based = self.rule_based.load(Ordering::Relaxed);
        let hybrid = self.hybrid.load(Ordering::Relaxed);
        let generative = self.generative.load(Ordering::Relaxed);
        let duration = self.total_duration_ms.load(Ordering::Relaxed);
        let rate = |n: u64| if total == 0 { 0.0 } else { n as f64 / total as f64 };

        StatsSnapshot {
            total,
            succeeded,
            failed: self.failed.load(Ordering::Relaxed),
            rule_based,
            hybrid,
            generative,
            error_recoveries: self.error_recoveries.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            average_duration_ms: rate(duration),
            success_rate: rate(succeeded),
            rule_based_rate: rate(rule_based),
            hybrid_rate: rate(hybrid),
            generative_rate: rate(generative),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [
            &self.total,
            &self.succeeded,
            &self.failed,
            &self.rule_based,
            &self.hybrid,
            &self.generative,
            &self.error_recoveries,
            &self.cache_hits,
            &self.total_duration_ms,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        log::info!("Conversion statistics reset");
    }
}

#[cfg(test)]
#[path = "stats_test.rs"]
mod tests;

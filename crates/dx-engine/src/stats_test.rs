use super::*;
use crate::error::ConvertError;
use crate::result::{ConversionMetadata, UnitOutcome, UnitReport};
use chrono::Utc;
use dx_core::RegionKind;
use std::sync::Arc;

fn unit(strategy: Strategy, cache_hit: bool) -> UnitReport {
    UnitReport {
        index: 0,
        kind: RegionKind::Plain,
        span: 0..1,
        complexity: 0,
        strategy,
        outcome: UnitOutcome::RuleBased,
        prompt: None,
        cache_hit,
        duration_ms: 0,
    }
}

fn success(strategy: Strategy, duration_ms: u64, cache_hit: bool) -> ConversionResult {
    let mut metadata = ConversionMetadata::new("t".to_string(), Utc::now());
    metadata.duration_ms = duration_ms;
    metadata.units = vec![unit(strategy, cache_hit)];
    ConversionResult::succeeded("SELECT 1".to_string(), strategy, vec![], metadata)
}

fn rejected() -> ConversionResult {
    let metadata = ConversionMetadata::new("t".to_string(), Utc::now());
    let err = ConvertError::validation("input SQL is empty");
    ConversionResult::failed(&err, Strategy::RuleBased, vec![], metadata)
}

#[test]
fn test_empty_snapshot() {
    let snapshot = ConversionStats::new().snapshot();
    assert_eq!(snapshot.total, 0);
    assert_eq!(snapshot.average_duration_ms, 0.0);
    assert_eq!(snapshot.success_rate, 0.0);
}

#[test]
fn test_record_counts_and_rates() {
    let stats = ConversionStats::new();
    stats.record(&success(Strategy::RuleBased, 10, false));
    stats.record(&success(Strategy::Generative, 30, true));
    stats.record(&rejected());
    stats.record(&success(Strategy::RuleBased, 20, false));

    let s = stats.snapshot();
    assert_eq!(s.total, 4);
    assert_eq!(s.succeeded, 3);
    assert_eq!(s.failed, 1);
    assert_eq!(s.rule_based, 2);
    assert_eq!(s.generative, 1);
    // Rejected requests never reach a strategy
    assert_eq!(s.hybrid, 0);
    assert_eq!(s.cache_hits, 1);
    assert_eq!(s.average_duration_ms, 15.0);
    assert_eq!(s.success_rate, 0.75);
    assert_eq!(s.rule_based_rate, 0.5);
}

#[test]
fn test_recovery_counted() {
    let stats = ConversionStats::new();
    let mut result = success(Strategy::Generative, 5, false);
    result.metadata.units.clear();
    result.metadata.error_recovered = true;
    stats.record(&result);

    let s = stats.snapshot();
    assert_eq!(s.error_recoveries, 1);
    assert_eq!(s.generative, 1);
}

#[test]
fn test_reset_zeroes_everything() {
    let stats = ConversionStats::new();
    stats.record(&success(Strategy::Hybrid, 7, true));
    stats.reset();
    let s = stats.snapshot();
    assert_eq!(s.total, 0);
    assert_eq!(s.hybrid, 0);
    assert_eq!(s.cache_hits, 0);
}

#[test]
fn test_concurrent_records_are_not_lost() {
    let stats = Arc::new(ConversionStats::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let stats = Arc::clone(&stats);
            std::thread::spawn(move || {
                for _ in 0..250 {
                    stats.record(&success(Strategy::RuleBased, 1, false));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let s = stats.snapshot();
    assert_eq!(s.total, 2000);
    assert_eq!(s.rule_based, 2000);
    assert_eq!(s.average_duration_ms, 1.0);
}

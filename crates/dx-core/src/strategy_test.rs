use super::*;
use super::Strategy;
use crate::config::MAX_COMPLEXITY;
use proptest::prelude::*;

#[test]
fn test_default_thresholds() {
    let s = StrategySelector::default();
    let (my, pg) = (Dialect::MySql, Dialect::Postgres);
    assert_eq!(s.select(my, pg, 0, false), Strategy::RuleBased);
    assert_eq!(s.select(my, pg, 3, false), Strategy::RuleBased);
    assert_eq!(s.select(my, pg, 4, false), Strategy::Hybrid);
    assert_eq!(s.select(my, pg, 6, false), Strategy::Hybrid);
    assert_eq!(s.select(my, pg, 7, false), Strategy::Generative);
}

#[test]
fn test_hard_pair_with_procedural_content_is_generative() {
    let s = StrategySelector::default();
    assert_eq!(
        s.select(Dialect::Oracle, Dialect::Postgres, 0, true),
        Strategy::Generative
    );
    // Same pair without procedural content follows the thresholds
    assert_eq!(
        s.select(Dialect::Oracle, Dialect::Postgres, 2, false),
        Strategy::RuleBased
    );
}

#[test]
fn test_procedural_content_on_easy_pair_uses_thresholds() {
    let s = StrategySelector::default();
    assert_eq!(
        s.select(Dialect::Postgres, Dialect::Redshift, 5, true),
        Strategy::Hybrid
    );
}

#[test]
fn test_explicit_hard_pairs_replace_derivation() {
    let config = StrategyConfig {
        hard_pairs: Some(vec![DialectPair::new(Dialect::MySql, Dialect::Sqlite)]),
        ..Default::default()
    };
    let s = StrategySelector::new(&config);
    assert!(s.is_hard_pair(Dialect::MySql, Dialect::Sqlite));
    assert!(!s.is_hard_pair(Dialect::Oracle, Dialect::Postgres));
}

#[test]
fn test_custom_thresholds() {
    let config = StrategyConfig {
        rule_based_max: 0,
        hybrid_max: 0,
        hard_pairs: None,
    };
    let s = StrategySelector::new(&config);
    assert_eq!(
        s.select(Dialect::MySql, Dialect::Postgres, 1, false),
        Strategy::Generative
    );
}

proptest! {
    #[test]
    fn prop_strategy_never_moves_back_to_rule_based(
        source in 0usize..Dialect::ALL.len(),
        target in 0usize..Dialect::ALL.len(),
        procedural in any::<bool>(),
    ) {
        let s = StrategySelector::default();
        let (source, target) = (Dialect::ALL[source], Dialect::ALL[target]);
        let mut previous = Strategy::RuleBased;
        for complexity in 0..=MAX_COMPLEXITY {
            let current = s.select(source, target, complexity, procedural);
            prop_assert!(current.rank() >= previous.rank(), "{} after {}", current, previous);
            previous = current;
        }
    }
}

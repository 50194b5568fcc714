//! Property-based tests for the cost model and the strategy search.

use proptest::prelude::*;

use pit_strategy::race_mechanics::{is_legal, race_time, stint_time};
use pit_strategy::strategy_search::compute_strategies_with_policy;
use pit_strategy::types::{SearchPolicy, TyrePrediction};

/// Strategy: a plausible tyre (base 60-120 s, degradation 0-0.3 s/lap).
fn tyre_strategy(name: &'static str) -> impl Strategy<Value = TyrePrediction> {
    (60.0..120.0f64, 0.0..0.3f64).prop_map(move |(base, deg)| TyrePrediction::new(name, base, deg))
}

/// Strategy: two or three distinct compounds.
fn tyre_set_strategy() -> impl Strategy<Value = Vec<TyrePrediction>> {
    prop_oneof![
        (tyre_strategy("SOFT"), tyre_strategy("HARD")).prop_map(|(a, b)| vec![a, b]),
        (
            tyre_strategy("SOFT"),
            tyre_strategy("MEDIUM"),
            tyre_strategy("HARD")
        )
            .prop_map(|(a, b, c)| vec![a, b, c]),
    ]
}

proptest! {
    // 1. Empty stint costs nothing, one lap costs the base time
    #[test]
    fn stint_time_edges(tyre in tyre_strategy("SOFT")) {
        prop_assert_eq!(stint_time(&tyre, 0), 0.0);
        prop_assert_eq!(stint_time(&tyre, 1), tyre.base_time);
    }

    // 2. Stint time strictly increases with length
    #[test]
    fn stint_time_increasing(tyre in tyre_strategy("SOFT"), n in 0..100u32) {
        prop_assert!(stint_time(&tyre, n + 1) > stint_time(&tyre, n));
    }

    // 3. Legality is exactly "two or more bits"
    #[test]
    fn legality_is_popcount(mask in any::<u32>()) {
        prop_assert_eq!(is_legal(mask), mask.count_ones() >= 2);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // 4. Returned strategies partition the race, are legal, ordered, and
    //    report the time their stints actually take
    #[test]
    fn strategies_are_well_formed(tyres in tyre_set_strategy(), laps in 6..28u32) {
        let result = compute_strategies_with_policy(laps, &tyres, &SearchPolicy::default());
        prop_assert!(!result.is_empty());
        prop_assert!(result.len() <= 3);

        for pair in result.windows(2) {
            prop_assert!(pair[0].total_time <= pair[1].total_time);
        }
        for s in &result {
            prop_assert_eq!(s.stints[0].start_lap, 1);
            prop_assert_eq!(s.stints.last().unwrap().end_lap, laps);
            for pair in s.stints.windows(2) {
                prop_assert_eq!(pair[0].end_lap + 1, pair[1].start_lap);
            }
            prop_assert_eq!(s.pit_stop_count as usize, s.stints.len() - 1);
            prop_assert!(s.distinct_compounds() >= 2);
            prop_assert!(s.total_time.is_finite() && s.total_time > 0.0);

            let replayed = race_time(&tyres, &s.stints).unwrap();
            prop_assert!((replayed - s.total_time).abs() < 1e-6);
        }
    }

    // 5. No hidden state between calls
    #[test]
    fn search_is_idempotent(tyres in tyre_set_strategy(), laps in 2..24u32) {
        let policy = SearchPolicy::default();
        let first = compute_strategies_with_policy(laps, &tyres, &policy);
        let second = compute_strategies_with_policy(laps, &tyres, &policy);
        prop_assert_eq!(first, second);
    }

    // 6. A single compound never yields a strategy
    #[test]
    fn single_compound_is_always_empty(tyre in tyre_strategy("SOFT"), laps in 1..30u32) {
        let result = compute_strategies_with_policy(laps, &[tyre], &SearchPolicy::default());
        prop_assert!(result.is_empty());
    }
}

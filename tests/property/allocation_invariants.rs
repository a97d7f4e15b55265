//! Largest Remainder allocation always hands out exactly the requested total

use leveler::leveling::allocation::{largest_remainder, normalize_weights};
use leveler::leveling::{allocate, DifficultyRatios, LevelingConfig};
use leveler::types::BlueprintItem;
use proptest::prelude::*;

fn weight() -> impl Strategy<Value = f64> {
    prop_oneof![
        3 => 0.0f64..100.0,
        1 => Just(0.0),
        1 => Just(-1.0),
    ]
}

proptest! {
    #[test]
    fn test_largest_remainder_sums_to_total(
        total in 0u64..10_000,
        weights in prop::collection::vec(weight(), 1..12),
    ) {
        let shares = largest_remainder(total, &weights);
        prop_assert_eq!(shares.len(), weights.len());
        prop_assert_eq!(shares.iter().sum::<u64>(), total);
    }

    #[test]
    fn test_shares_stay_within_one_of_exact_quota(
        total in 0u64..10_000,
        weights in prop::collection::vec(weight(), 1..12),
    ) {
        let normalized = normalize_weights(&weights);
        let shares = largest_remainder(total, &weights);
        for (share, w) in shares.iter().zip(&normalized) {
            let exact = total as f64 * w;
            prop_assert!((*share as f64 - exact).abs() < 1.0 + 1e-6);
        }
    }

    #[test]
    fn test_domain_and_difficulty_targets_sum(
        target_total in 0u64..2_000,
        weights in prop::collection::vec(weight(), 1..8),
        easy in 0.0f64..1.0,
        medium in 0.0f64..1.0,
        hard in 0.0f64..1.0,
    ) {
        let domains: Vec<String> = (0..weights.len()).map(|i| format!("D{}", i)).collect();
        let blueprint: Vec<BlueprintItem> = domains
            .iter()
            .zip(&weights)
            .map(|(d, w)| BlueprintItem::new(d.clone(), *w))
            .collect();
        let config = LevelingConfig {
            target_total,
            ratios: DifficultyRatios::new(easy, medium, hard),
        };

        let plan = allocate(&domains, &blueprint, &config);
        prop_assert_eq!(plan.domain_target_sum(), target_total);
        for allocation in &plan.domains {
            prop_assert_eq!(
                allocation.difficulty_targets.iter().sum::<u64>(),
                allocation.target
            );
        }
    }
}

/// Ties always resolve toward the earlier weight
#[test]
fn test_tie_break_is_stable() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..10, 0u64..1_000), |(len, total)| {
            let shares = largest_remainder(total, &vec![1.0; len]);
            for pair in shares.windows(2) {
                prop_assert!(pair[0] >= pair[1]);
            }
            Ok(())
        })
        .unwrap();
}

//! Gap analysis never plans past the global target and does not change between reads

use chrono::Utc;
use leveler::leveling::{analyze, DifficultyRatios, LevelingConfig};
use leveler::store::{MemoryQuestionStore, NewQuestion, QuestionStore};
use leveler::types::Difficulty;
use proptest::prelude::*;
use tokio::runtime::Runtime;

const DOMAINS: [&str; 3] = ["People", "Process", "Business"];

/// (domain index, difficulty index) per existing question
fn inventory() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..4, 0usize..3), 0..120)
}

fn seeded_store(runtime: &Runtime, inventory: &[(usize, usize)]) -> MemoryQuestionStore {
    let store = MemoryQuestionStore::new();
    runtime.block_on(async {
        for (i, (domain, difficulty)) in inventory.iter().enumerate() {
            // Index 3 is a domain the exam does not declare
            let domain = DOMAINS.get(*domain).copied().unwrap_or("Retired");
            store
                .insert_question(NewQuestion {
                    exam_id: "pmp".to_string(),
                    domain: domain.to_string(),
                    difficulty: Difficulty::ALL[*difficulty],
                    stem: format!("q{}", i),
                    options: Vec::new(),
                    correct_answer: "0".to_string(),
                    explanation: String::new(),
                    source: "manual".to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
    });
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_gaps_never_exceed_global_remaining(
        existing in inventory(),
        target_total in 0u64..150,
        easy in 0.0f64..1.0,
        medium in 0.0f64..1.0,
        hard in 0.0f64..1.0,
    ) {
        let runtime = Runtime::new().unwrap();
        let store = seeded_store(&runtime, &existing);
        let domains: Vec<String> = DOMAINS.iter().map(|d| d.to_string()).collect();
        let config = LevelingConfig {
            target_total,
            ratios: DifficultyRatios::new(easy, medium, hard),
        };

        let report = runtime
            .block_on(analyze(&store, "pmp", &domains, &[], &config))
            .unwrap();

        let global_remaining = target_total.saturating_sub(existing.len() as u64);
        prop_assert!(report.total_missing() <= global_remaining);
        prop_assert_eq!(report.entries.len(), 9);
    }

    #[test]
    fn test_analyze_is_idempotent(
        existing in inventory(),
        target_total in 0u64..150,
    ) {
        let runtime = Runtime::new().unwrap();
        let store = seeded_store(&runtime, &existing);
        let domains: Vec<String> = DOMAINS.iter().map(|d| d.to_string()).collect();
        let config = LevelingConfig {
            target_total,
            ..LevelingConfig::default()
        };

        let first = runtime
            .block_on(analyze(&store, "pmp", &domains, &[], &config))
            .unwrap();
        let second = runtime
            .block_on(analyze(&store, "pmp", &domains, &[], &config))
            .unwrap();
        prop_assert_eq!(first, second);
    }
}

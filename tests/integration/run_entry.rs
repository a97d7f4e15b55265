//! Run entry point against stored exam records

use super::test_utils::{exam, seed_questions, temp_store, ScriptedGenerator};
use leveler::config::LevelingSettings;
use leveler::error::ApiError;
use leveler::leveling::{run_analyze, run_execute, DifficultyRatios, LevelRequest};
use leveler::store::QuestionStore;
use leveler::types::Difficulty;

fn domain_target(outcome: &leveler::leveling::LevelOutcome, domain: &str) -> u64 {
    outcome
        .report
        .entries
        .iter()
        .filter(|e| e.domain == domain)
        .map(|e| e.target)
        .sum()
}

#[tokio::test]
async fn test_blueprint_weights_drive_domain_targets() {
    let (_dir, store) = temp_store();
    store
        .put_exam(&exam(
            "pmp",
            &["People", "Process", "Business Environment"],
            &[("People", 42.0), ("Process", 50.0), ("Business Environment", 8.0)],
        ))
        .await
        .unwrap();

    let outcome = run_analyze(&store, &LevelRequest::new("pmp"), &LevelingSettings::default())
        .await
        .unwrap();

    assert_eq!(domain_target(&outcome, "People"), 84);
    assert_eq!(domain_target(&outcome, "Process"), 100);
    assert_eq!(domain_target(&outcome, "Business Environment"), 16);
    assert_eq!(outcome.planned, 200);
    assert_eq!(outcome.generated, 0);
}

#[tokio::test]
async fn test_even_split_scenario() {
    let (_dir, store) = temp_store();
    store
        .put_exam(&exam("pmp", &["A", "B", "C"], &[]))
        .await
        .unwrap();
    let request = LevelRequest::new("pmp").with_target_total(10);

    let outcome = run_analyze(&store, &request, &LevelingSettings::default())
        .await
        .unwrap();

    assert_eq!(domain_target(&outcome, "A"), 4);
    assert_eq!(domain_target(&outcome, "B"), 3);
    assert_eq!(domain_target(&outcome, "C"), 3);
    let a: Vec<u64> = Difficulty::ALL
        .iter()
        .map(|d| outcome.report.entry("A", *d).unwrap().target)
        .collect();
    assert_eq!(a, vec![0, 2, 2]);
    let b: Vec<u64> = Difficulty::ALL
        .iter()
        .map(|d| outcome.report.entry("B", *d).unwrap().target)
        .collect();
    assert_eq!(b, vec![0, 2, 1]);
}

#[tokio::test]
async fn test_execute_respects_configured_batch_size() {
    let (_dir, store) = temp_store();
    store.put_exam(&exam("pmp", &["People"], &[])).await.unwrap();
    let generator = ScriptedGenerator::new();
    let settings = LevelingSettings {
        target_total: 7,
        ratios: DifficultyRatios::new(0.0, 1.0, 0.0),
        batch_size: 2,
    };

    let outcome = run_execute(&store, &generator, &LevelRequest::new("pmp"), &settings, None)
        .await
        .unwrap();

    assert_eq!(outcome.planned, 7);
    assert_eq!(outcome.generated, 7);
    assert_eq!(outcome.summary(), "7 questions generated out of 7 planned");
    let counts: Vec<u64> = generator.requests.lock().iter().map(|r| r.count).collect();
    assert_eq!(counts, vec![2, 2, 2, 1]);
    assert_eq!(store.get_exam("pmp").await.unwrap().unwrap().question_count, 7);
}

#[tokio::test]
async fn test_partial_generation_is_reported() {
    let (_dir, store) = temp_store();
    store
        .put_exam(&exam("pmp", &["People", "Process"], &[]))
        .await
        .unwrap();
    let generator = ScriptedGenerator::failing_for("People");
    let request = LevelRequest::new("pmp").with_target_total(20);

    let outcome = run_execute(&store, &generator, &request, &LevelingSettings::default(), None)
        .await
        .unwrap();

    assert_eq!(outcome.planned, 20);
    assert_eq!(outcome.generated, 10);
}

#[tokio::test]
async fn test_existing_inventory_reduces_the_plan() {
    let (_dir, store) = temp_store();
    store
        .put_exam(&exam("pmp", &["People", "Process"], &[]))
        .await
        .unwrap();
    seed_questions(&store, "pmp", "People", Difficulty::Hard, 3).await;
    let request = LevelRequest::new("pmp").with_target_total(20);

    let outcome = run_analyze(&store, &request, &LevelingSettings::default())
        .await
        .unwrap();

    let hard = outcome.report.entry("People", Difficulty::Hard).unwrap();
    assert_eq!(hard.current, 3);
    assert_eq!(hard.gap(), 1);
    assert_eq!(outcome.planned, 17);
}

#[tokio::test]
async fn test_undeclared_blueprint_domain_fails_before_planning() {
    let (_dir, store) = temp_store();
    store
        .put_exam(&exam("pmp", &["People"], &[("Agile", 1.0)]))
        .await
        .unwrap();
    let generator = ScriptedGenerator::new();

    let err = run_execute(
        &store,
        &generator,
        &LevelRequest::new("pmp"),
        &LevelingSettings::default(),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::UnknownDomain { ref domain, .. } if domain == "Agile"));
    assert_eq!(generator.request_count(), 0);
}

#[tokio::test]
async fn test_recount_repairs_counter_drift() {
    let (_dir, store) = temp_store();
    store.put_exam(&exam("pmp", &["People"], &[])).await.unwrap();
    seed_questions(&store, "pmp", "People", Difficulty::Easy, 4).await;
    store.increment_question_count("pmp", 10).await.unwrap();

    assert_eq!(store.get_exam("pmp").await.unwrap().unwrap().question_count, 14);
    assert_eq!(store.recount_questions("pmp").await.unwrap(), 4);
    assert_eq!(store.get_exam("pmp").await.unwrap().unwrap().question_count, 4);
}

//! End-to-end leveling through AutoLeveler backed by the sled store

use super::test_utils::{exam, seed_questions, temp_store, ScriptedGenerator};
use leveler::leveling::{AutoLeveler, DifficultyRatios, LevelingConfig};
use leveler::provider::QuestionGenerator;
use leveler::store::{QuestionStore, AUTO_LEVELER_SOURCE};
use leveler::types::Difficulty;
use parking_lot::Mutex;
use std::sync::Arc;

fn domains(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_execute_levels_an_empty_exam() {
    let (_dir, store) = temp_store();
    store
        .put_exam(&exam("pmp", &["People", "Process", "Business"], &[]))
        .await
        .unwrap();
    let store: Arc<dyn QuestionStore> = Arc::new(store);
    let generator = Arc::new(ScriptedGenerator::new());
    let leveler = AutoLeveler::new(Arc::clone(&store), generator.clone());
    let config = LevelingConfig {
        target_total: 30,
        ..LevelingConfig::default()
    };
    let names = domains(&["People", "Process", "Business"]);

    let report = leveler
        .execute("pmp", &names, &[], &config, None)
        .await
        .unwrap();

    assert_eq!(report.total_generated(), 30);
    // 10 per domain: E1 M5 H4, one batch each
    assert_eq!(generator.request_count(), 9);
    let people_medium = report.entry("People", Difficulty::Medium).unwrap();
    assert_eq!((people_medium.target, people_medium.generated), (5, 5));

    let questions = store.questions_for_exam("pmp").await.unwrap();
    assert_eq!(questions.len(), 30);
    assert!(questions.iter().all(|q| q.source == AUTO_LEVELER_SOURCE));
    let exam = store.get_exam("pmp").await.unwrap().unwrap();
    assert_eq!(exam.question_count, 30);

    let after = leveler.analyze("pmp", &names, &[], &config).await.unwrap();
    assert!(!after.has_gaps());
    assert_eq!(after.total_missing(), 0);
}

#[tokio::test]
async fn test_each_batch_sees_previous_stems() {
    let (_dir, store) = temp_store();
    store.put_exam(&exam("pmp", &["People"], &[])).await.unwrap();
    let store: Arc<dyn QuestionStore> = Arc::new(store);
    let generator = Arc::new(ScriptedGenerator::new());
    let leveler = AutoLeveler::new(Arc::clone(&store), generator.clone());
    let config = LevelingConfig {
        target_total: 20,
        ratios: DifficultyRatios::new(0.0, 1.0, 0.0),
    };

    leveler
        .execute("pmp", &domains(&["People"]), &[], &config, None)
        .await
        .unwrap();

    let requests = generator.requests.lock();
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|r| r.count == 5));
    assert_eq!(requests[0].existing_stems.len(), 0);
    assert_eq!(requests[1].existing_stems.len(), 5);
    assert_eq!(requests[3].existing_stems.len(), 15);
}

#[tokio::test]
async fn test_failing_domain_does_not_block_others() {
    let (_dir, store) = temp_store();
    store
        .put_exam(&exam("pmp", &["People", "Process"], &[]))
        .await
        .unwrap();
    let store: Arc<dyn QuestionStore> = Arc::new(store);
    let generator: Arc<dyn QuestionGenerator> = Arc::new(ScriptedGenerator::failing_for("Process"));
    let leveler = AutoLeveler::new(Arc::clone(&store), generator);
    let config = LevelingConfig {
        target_total: 20,
        ..LevelingConfig::default()
    };

    let report = leveler
        .execute("pmp", &domains(&["People", "Process"]), &[], &config, None)
        .await
        .unwrap();

    for difficulty in Difficulty::ALL {
        let people = report.entry("People", difficulty).unwrap();
        assert_eq!(people.generated, people.target - people.current);
        assert_eq!(report.entry("Process", difficulty).unwrap().generated, 0);
    }
    assert_eq!(store.questions_for_exam("pmp").await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_over_inventory_is_a_no_op() {
    let (_dir, store) = temp_store();
    store.put_exam(&exam("pmp", &["People"], &[])).await.unwrap();
    seed_questions(&store, "pmp", "People", Difficulty::Medium, 250).await;
    let store: Arc<dyn QuestionStore> = Arc::new(store);
    let generator = Arc::new(ScriptedGenerator::new());
    let leveler = AutoLeveler::new(Arc::clone(&store), generator.clone());

    let report = leveler
        .execute("pmp", &domains(&["People"]), &[], &LevelingConfig::default(), None)
        .await
        .unwrap();

    assert!(report.entries.iter().all(|e| e.target == e.current));
    assert_eq!(report.total_generated(), 0);
    assert_eq!(generator.request_count(), 0);
    assert_eq!(store.questions_for_exam("pmp").await.unwrap().len(), 250);
}

#[tokio::test]
async fn test_progress_reports_each_batch() {
    let (_dir, store) = temp_store();
    store.put_exam(&exam("pmp", &["People"], &[])).await.unwrap();
    let store: Arc<dyn QuestionStore> = Arc::new(store);
    let leveler = AutoLeveler::new(store, Arc::new(ScriptedGenerator::new()));
    let config = LevelingConfig {
        target_total: 12,
        ratios: DifficultyRatios::new(0.0, 0.0, 1.0),
    };

    let lines = Mutex::new(Vec::new());
    let on_progress = |line: &str| lines.lock().push(line.to_string());
    leveler
        .execute("pmp", &domains(&["People"]), &[], &config, Some(&on_progress))
        .await
        .unwrap();

    let lines = lines.into_inner();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("People"));
    assert!(lines[0].contains("Missing: 12"));
    assert!(lines[2].contains("Missing: 2"));
}

#[tokio::test]
async fn test_short_batches_keep_the_bucket_going() {
    let (_dir, store) = temp_store();
    store.put_exam(&exam("pmp", &["People"], &[])).await.unwrap();
    let store: Arc<dyn QuestionStore> = Arc::new(store);
    let generator = Arc::new(ScriptedGenerator::capped_at(3));
    let leveler = AutoLeveler::new(Arc::clone(&store), generator.clone());
    let config = LevelingConfig {
        target_total: 10,
        ratios: DifficultyRatios::new(1.0, 0.0, 0.0),
    };

    let report = leveler
        .execute("pmp", &domains(&["People"]), &[], &config, None)
        .await
        .unwrap();

    let counts: Vec<u64> = generator.requests.lock().iter().map(|r| r.count).collect();
    assert_eq!(counts, vec![5, 5, 4, 1]);
    assert_eq!(report.entry("People", Difficulty::Easy).unwrap().generated, 10);
    assert_eq!(store.get_exam("pmp").await.unwrap().unwrap().question_count, 10);
}

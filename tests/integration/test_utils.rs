//! Shared test utilities for integration tests
//!
//! Provides a deterministic generator and helpers for seeding sled-backed stores.

use async_trait::async_trait;
use chrono::Utc;
use leveler::error::ApiError;
use leveler::provider::{GeneratedQuestion, GenerationRequest, QuestionGenerator};
use leveler::store::{ExamRecord, NewQuestion, QuestionStore, SledQuestionStore};
use leveler::types::{BlueprintItem, Difficulty};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Generator that answers every request in full with unique stems, unless told to
/// fail for a topic or to cap how many it returns per call.
pub struct ScriptedGenerator {
    pub requests: Mutex<Vec<GenerationRequest>>,
    fail_topic: Option<String>,
    max_per_call: Option<u64>,
    counter: Mutex<u64>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_topic: None,
            max_per_call: None,
            counter: Mutex::new(0),
        }
    }

    pub fn failing_for(topic: &str) -> Self {
        Self {
            fail_topic: Some(topic.to_string()),
            ..Self::new()
        }
    }

    pub fn capped_at(max_per_call: u64) -> Self {
        Self {
            max_per_call: Some(max_per_call),
            ..Self::new()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, ApiError> {
        self.requests.lock().push(request.clone());
        if self.fail_topic.as_deref() == Some(request.topic.as_str()) {
            return Err(ApiError::GenerationFailed("scripted failure".to_string()));
        }

        let count = self
            .max_per_call
            .map(|max| max.min(request.count))
            .unwrap_or(request.count);
        let mut counter = self.counter.lock();
        let mut questions = Vec::new();
        for _ in 0..count {
            *counter += 1;
            questions.push(GeneratedQuestion {
                stem: format!("{} {} question #{}", request.topic, request.difficulty, counter),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: "0".to_string(),
                explanation: "Scripted.".to_string(),
            });
        }
        Ok(questions)
    }

    fn generator_name(&self) -> &str {
        "scripted"
    }
}

/// Open a sled store inside a fresh temporary directory
pub fn temp_store() -> (TempDir, SledQuestionStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = SledQuestionStore::new(temp_dir.path().join("store")).unwrap();
    (temp_dir, store)
}

pub fn exam(exam_id: &str, domains: &[&str], blueprint: &[(&str, f64)]) -> ExamRecord {
    ExamRecord {
        exam_id: exam_id.to_string(),
        name: format!("{} exam", exam_id),
        domains: domains.iter().map(|d| d.to_string()).collect(),
        blueprint: blueprint
            .iter()
            .map(|(domain, weight)| BlueprintItem::new(*domain, *weight))
            .collect(),
        question_count: 0,
    }
}

/// Insert `count` manual questions into one bucket and bump the exam counter
pub async fn seed_questions<S: QuestionStore + ?Sized>(
    store: &S,
    exam_id: &str,
    domain: &str,
    difficulty: Difficulty,
    count: u64,
) {
    for i in 0..count {
        store
            .insert_question(NewQuestion {
                exam_id: exam_id.to_string(),
                domain: domain.to_string(),
                difficulty,
                stem: format!("seeded {} {} {}", domain, difficulty, i),
                options: Vec::new(),
                correct_answer: "0".to_string(),
                explanation: String::new(),
                source: "manual".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }
    if store.get_exam(exam_id).await.unwrap().is_some() {
        store.increment_question_count(exam_id, count).await.unwrap();
    }
}

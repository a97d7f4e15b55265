//! Question Store
//!
//! Document-store collaborator for the leveler: the `questions` collection
//! (queried by exam, and by exam + domain for stems) and the `exams` collection
//! with its aggregate `question_count` counter.

pub mod memory;
pub mod persistence;

pub use memory::MemoryQuestionStore;
pub use persistence::SledQuestionStore;

use crate::error::StorageError;
use crate::types::{BlueprintItem, Difficulty, ExamID};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source tag written on questions created by the gap-fill executor
pub const AUTO_LEVELER_SOURCE: &str = "AI-AutoLeveler";

/// A stored question document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Store-assigned identity; never changes once created
    pub id: u64,
    pub exam_id: ExamID,
    pub domain: String,
    pub difficulty: Difficulty,
    pub stem: String,
    pub options: Vec<String>,
    /// Index or label of the correct option, as produced by the author/generator
    pub correct_answer: String,
    pub explanation: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// A question that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub exam_id: ExamID,
    pub domain: String,
    pub difficulty: Difficulty,
    pub stem: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl NewQuestion {
    pub(crate) fn into_record(self, id: u64) -> QuestionRecord {
        QuestionRecord {
            id,
            exam_id: self.exam_id,
            domain: self.domain,
            difficulty: self.difficulty,
            stem: self.stem,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            source: self.source,
            created_at: self.created_at,
        }
    }
}

/// An exam document: declared domains, weight blueprint and aggregate counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub exam_id: ExamID,
    pub name: String,
    pub domains: Vec<String>,
    #[serde(default)]
    pub blueprint: Vec<BlueprintItem>,
    #[serde(default)]
    pub question_count: u64,
}

impl ExamRecord {
    pub fn declares_domain(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| d == domain)
    }
}

/// Document store interface used by the planner and the executor.
///
/// Reads are equality-filtered; writes are inserts plus an atomic counter increment.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// All questions whose `exam_id` equals the given id
    async fn questions_for_exam(&self, exam_id: &str) -> Result<Vec<QuestionRecord>, StorageError>;

    /// Stems of questions matching both `exam_id` and `domain`
    async fn stems_for_domain(
        &self,
        exam_id: &str,
        domain: &str,
    ) -> Result<Vec<String>, StorageError> {
        Ok(self
            .questions_for_exam(exam_id)
            .await?
            .into_iter()
            .filter(|q| q.domain == domain)
            .map(|q| q.stem)
            .collect())
    }

    /// Insert a new question document and return it with its assigned id
    async fn insert_question(&self, question: NewQuestion) -> Result<QuestionRecord, StorageError>;

    async fn get_exam(&self, exam_id: &str) -> Result<Option<ExamRecord>, StorageError>;

    async fn put_exam(&self, exam: &ExamRecord) -> Result<(), StorageError>;

    /// Atomically add `by` to the exam's `question_count`; returns the new value
    async fn increment_question_count(&self, exam_id: &str, by: u64) -> Result<u64, StorageError>;

    /// Set `question_count` from an actual count of the exam's questions
    async fn recount_questions(&self, exam_id: &str) -> Result<u64, StorageError>;
}

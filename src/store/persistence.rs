//! Persistence layer for the Question Store

use crate::error::StorageError;
use crate::store::{ExamRecord, NewQuestion, QuestionRecord, QuestionStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const QUESTIONS_TREE: &str = "questions";
const EXAMS_TREE: &str = "exams";

/// Sled-based implementation of QuestionStore
///
/// Questions are keyed `exam_id \0 id` so the per-exam equality query is a prefix scan.
pub struct SledQuestionStore {
    db: sled::Db,
    questions: sled::Tree,
    exams: sled::Tree,
}

impl SledQuestionStore {
    /// Open (or create) a store at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| {
            StorageError::Database(format!("Failed to open sled database: {}", e))
        })?;
        Self::from_db(db)
    }

    /// Build the store on an already-open database
    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let questions = db.open_tree(QUESTIONS_TREE)?;
        let exams = db.open_tree(EXAMS_TREE)?;
        Ok(Self {
            db,
            questions,
            exams,
        })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn exam_prefix(exam_id: &str) -> Vec<u8> {
        let mut prefix = exam_id.as_bytes().to_vec();
        prefix.push(0);
        prefix
    }

    fn question_key(exam_id: &str, id: u64) -> Vec<u8> {
        let mut key = Self::exam_prefix(exam_id);
        key.extend_from_slice(&id.to_be_bytes());
        key
    }

    fn scan_exam(&self, exam_id: &str) -> Result<Vec<QuestionRecord>, StorageError> {
        let mut records = Vec::new();
        for item in self.questions.scan_prefix(Self::exam_prefix(exam_id)) {
            let (_, value) = item?;
            records.push(decode::<QuestionRecord>(&value, "question")?);
        }
        Ok(records)
    }
}

fn encode<T: Serialize>(value: &T, what: &str) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(value)
        .map_err(|e| StorageError::InvalidData(format!("Failed to serialize {}: {}", what, e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T, StorageError> {
    bincode::deserialize(bytes)
        .map_err(|e| StorageError::InvalidData(format!("Failed to deserialize {}: {}", what, e)))
}

#[async_trait]
impl QuestionStore for SledQuestionStore {
    async fn questions_for_exam(&self, exam_id: &str) -> Result<Vec<QuestionRecord>, StorageError> {
        self.scan_exam(exam_id)
    }

    async fn stems_for_domain(
        &self,
        exam_id: &str,
        domain: &str,
    ) -> Result<Vec<String>, StorageError> {
        Ok(self
            .scan_exam(exam_id)?
            .into_iter()
            .filter(|q| q.domain == domain)
            .map(|q| q.stem)
            .collect())
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<QuestionRecord, StorageError> {
        let id = self.db.generate_id()?;
        let record = question.into_record(id);
        let value = encode(&record, "question")?;
        self.questions
            .insert(Self::question_key(&record.exam_id, id), value)?;
        Ok(record)
    }

    async fn get_exam(&self, exam_id: &str) -> Result<Option<ExamRecord>, StorageError> {
        match self.exams.get(exam_id.as_bytes())? {
            Some(value) => Ok(Some(decode(&value, "exam")?)),
            None => Ok(None),
        }
    }

    async fn put_exam(&self, exam: &ExamRecord) -> Result<(), StorageError> {
        let value = encode(exam, "exam")?;
        self.exams.insert(exam.exam_id.as_bytes(), value)?;
        Ok(())
    }

    async fn increment_question_count(&self, exam_id: &str, by: u64) -> Result<u64, StorageError> {
        // Compare-and-swap until no concurrent writer has touched the document.
        loop {
            let current = self
                .exams
                .get(exam_id.as_bytes())?
                .ok_or_else(|| StorageError::ExamNotFound(exam_id.to_string()))?;
            let mut exam: ExamRecord = decode(&current, "exam")?;
            exam.question_count = exam.question_count.saturating_add(by);
            let updated = encode(&exam, "exam")?;
            if self
                .exams
                .compare_and_swap(exam_id.as_bytes(), Some(current), Some(updated))?
                .is_ok()
            {
                return Ok(exam.question_count);
            }
        }
    }

    async fn recount_questions(&self, exam_id: &str) -> Result<u64, StorageError> {
        let actual = self.questions.scan_prefix(Self::exam_prefix(exam_id)).count() as u64;
        loop {
            let current = self
                .exams
                .get(exam_id.as_bytes())?
                .ok_or_else(|| StorageError::ExamNotFound(exam_id.to_string()))?;
            let mut exam: ExamRecord = decode(&current, "exam")?;
            exam.question_count = actual;
            let updated = encode(&exam, "exam")?;
            if self
                .exams
                .compare_and_swap(exam_id.as_bytes(), Some(current), Some(updated))?
                .is_ok()
            {
                return Ok(actual);
            }
        }
    }
}

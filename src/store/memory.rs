//! In-process Question Store backed by a mutex-guarded map.

use crate::error::StorageError;
use crate::store::{ExamRecord, NewQuestion, QuestionRecord, QuestionStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct MemoryState {
    questions: Vec<QuestionRecord>,
    exams: HashMap<String, ExamRecord>,
    next_id: u64,
}

/// QuestionStore kept entirely in memory; nothing is persisted.
#[derive(Default)]
pub struct MemoryQuestionStore {
    state: Mutex<MemoryState>,
}

impl MemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of questions held for every exam
    pub fn len(&self) -> usize {
        self.state.lock().questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn questions_for_exam(&self, exam_id: &str) -> Result<Vec<QuestionRecord>, StorageError> {
        Ok(self
            .state
            .lock()
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<QuestionRecord, StorageError> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let record = question.into_record(state.next_id);
        state.questions.push(record.clone());
        Ok(record)
    }

    async fn get_exam(&self, exam_id: &str) -> Result<Option<ExamRecord>, StorageError> {
        Ok(self.state.lock().exams.get(exam_id).cloned())
    }

    async fn put_exam(&self, exam: &ExamRecord) -> Result<(), StorageError> {
        self.state
            .lock()
            .exams
            .insert(exam.exam_id.clone(), exam.clone());
        Ok(())
    }

    async fn increment_question_count(&self, exam_id: &str, by: u64) -> Result<u64, StorageError> {
        let mut state = self.state.lock();
        let exam = state
            .exams
            .get_mut(exam_id)
            .ok_or_else(|| StorageError::ExamNotFound(exam_id.to_string()))?;
        exam.question_count = exam.question_count.saturating_add(by);
        Ok(exam.question_count)
    }

    async fn recount_questions(&self, exam_id: &str) -> Result<u64, StorageError> {
        let mut state = self.state.lock();
        let actual = state
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .count() as u64;
        let exam = state
            .exams
            .get_mut(exam_id)
            .ok_or_else(|| StorageError::ExamNotFound(exam_id.to_string()))?;
        exam.question_count = actual;
        Ok(actual)
    }
}

//! Gap-fill executor: walks a gap report and asks the generator for the missing questions.
//! Buckets and batches run strictly one after another; each batch re-reads existing stems
//! so the duplicate-avoidance hint reflects everything generated before it.

use crate::error::ApiError;
use crate::leveling::planner::{analyze, GapEntry, GapReport, LevelingConfig};
use crate::provider::{GenerationRequest, QuestionGenerator};
use crate::store::{NewQuestion, QuestionStore, AUTO_LEVELER_SOURCE};
use crate::types::BlueprintItem;
use chrono::Utc;
use tracing::{error, info, warn};

/// Progress side channel: receives one human-readable line per batch
pub type ProgressCallback<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// How a single bucket ended
#[derive(Debug)]
enum BucketOutcome {
    Filled,
    GeneratorExhausted,
    Failed(ApiError),
}

/// Fills gaps bucket by bucket with capped generation batches.
pub struct GapFillExecutor {
    batch_size: u64,
}

impl Default for GapFillExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl GapFillExecutor {
    /// Largest count requested from the generator in one call
    pub const DEFAULT_BATCH_SIZE: u64 = 5;

    pub fn new() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    /// Use a different per-call cap (values below 1 are raised to 1)
    pub fn with_batch_size(batch_size: u64) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Analyze the exam, then generate and persist questions for every bucket with a gap.
    ///
    /// Generation and persistence failures stop only the bucket they happen in; the
    /// returned report covers every bucket with `generated` filled in. Only the initial
    /// inventory read can fail the call.
    #[allow(clippy::too_many_arguments)]
    pub async fn execute<S, G>(
        &self,
        store: &S,
        generator: &G,
        exam_id: &str,
        domains: &[String],
        blueprint: &[BlueprintItem],
        config: &LevelingConfig,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<GapReport, ApiError>
    where
        S: QuestionStore + ?Sized,
        G: QuestionGenerator + ?Sized,
    {
        let mut report = analyze(store, exam_id, domains, blueprint, config).await?;
        if !report.has_gaps() {
            info!(exam_id, "No gaps found; nothing to generate");
            return Ok(report);
        }

        info!(
            exam_id,
            planned = report.total_missing(),
            generator = generator.generator_name(),
            "Auto-leveling started"
        );

        for entry in report.entries.iter_mut() {
            if entry.current >= entry.target {
                continue;
            }
            match self
                .fill_bucket(store, generator, exam_id, entry, on_progress)
                .await
            {
                BucketOutcome::Filled => {
                    info!(
                        exam_id,
                        domain = %entry.domain,
                        difficulty = %entry.difficulty,
                        generated = entry.generated,
                        "Bucket filled"
                    );
                }
                BucketOutcome::GeneratorExhausted => {
                    warn!(
                        exam_id,
                        domain = %entry.domain,
                        difficulty = %entry.difficulty,
                        generated = entry.generated,
                        "Generator returned 0 questions; stopping this bucket"
                    );
                }
                BucketOutcome::Failed(err) => {
                    error!(
                        exam_id,
                        domain = %entry.domain,
                        difficulty = %entry.difficulty,
                        generated = entry.generated,
                        error = %err,
                        "Failed to generate; stopping this bucket"
                    );
                }
            }
        }

        info!(
            exam_id,
            planned = report.total_missing(),
            generated = report.total_generated(),
            "Auto-leveling finished"
        );
        Ok(report)
    }

    async fn fill_bucket<S, G>(
        &self,
        store: &S,
        generator: &G,
        exam_id: &str,
        entry: &mut GapEntry,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> BucketOutcome
    where
        S: QuestionStore + ?Sized,
        G: QuestionGenerator + ?Sized,
    {
        loop {
            let needed = entry.remaining();
            if needed == 0 {
                return BucketOutcome::Filled;
            }
            let count = needed.min(self.batch_size);

            if let Some(progress) = on_progress {
                progress(&format!(
                    "Generating {} questions for domain: {} (Missing: {})...",
                    entry.difficulty, entry.domain, needed
                ));
            }

            match self
                .fill_batch(store, generator, exam_id, entry, count)
                .await
            {
                Ok(0) => return BucketOutcome::GeneratorExhausted,
                Ok(_) => {}
                Err(err) => return BucketOutcome::Failed(err),
            }
        }
    }

    /// One generation call plus persistence; returns how many questions were stored.
    async fn fill_batch<S, G>(
        &self,
        store: &S,
        generator: &G,
        exam_id: &str,
        entry: &mut GapEntry,
        count: u64,
    ) -> Result<u64, ApiError>
    where
        S: QuestionStore + ?Sized,
        G: QuestionGenerator + ?Sized,
    {
        let existing_stems = store.stems_for_domain(exam_id, &entry.domain).await?;
        let request = GenerationRequest {
            topic: entry.domain.clone(),
            count,
            difficulty: entry.difficulty,
            existing_stems,
        };
        let generated = generator.generate(&request).await?;
        if generated.is_empty() {
            return Ok(0);
        }

        let mut persisted = 0u64;
        let mut failure = None;
        for question in generated {
            let new_question = NewQuestion {
                exam_id: exam_id.to_string(),
                domain: entry.domain.clone(),
                difficulty: entry.difficulty,
                stem: question.stem,
                options: question.options,
                correct_answer: question.correct_answer,
                explanation: question.explanation,
                source: AUTO_LEVELER_SOURCE.to_string(),
                created_at: Utc::now(),
            };
            if let Err(err) = store.insert_question(new_question).await {
                failure = Some(ApiError::from(err));
                break;
            }
            persisted += 1;
        }

        if persisted > 0 {
            entry.generated += persisted;
            store.increment_question_count(exam_id, persisted).await?;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(persisted),
        }
    }
}

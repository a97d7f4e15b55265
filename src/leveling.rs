//! Exam auto-leveling: allocation planner and gap-fill executor.
//! The planner only reads inventory; the executor generates and persists through collaborators.

pub mod allocation;
pub mod executor;
pub mod planner;
pub mod run;

pub use executor::{GapFillExecutor, ProgressCallback};
pub use planner::{
    allocate, analyze, plan_gaps, AllocationPlan, DifficultyRatios, DomainAllocation, GapEntry,
    GapReport, LevelingConfig,
};
pub use run::{run_analyze, run_execute, LevelOutcome, LevelRequest};

use crate::error::ApiError;
use crate::provider::QuestionGenerator;
use crate::store::QuestionStore;
use crate::types::BlueprintItem;
use std::sync::Arc;

/// Planner/executor pair bound to a store and a generator.
pub struct AutoLeveler {
    store: Arc<dyn QuestionStore>,
    generator: Arc<dyn QuestionGenerator>,
    executor: GapFillExecutor,
}

impl AutoLeveler {
    pub fn new(store: Arc<dyn QuestionStore>, generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            store,
            generator,
            executor: GapFillExecutor::new(),
        }
    }

    pub fn with_executor(mut self, executor: GapFillExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Report what is missing per (domain, difficulty) bucket.
    pub async fn analyze(
        &self,
        exam_id: &str,
        domains: &[String],
        blueprint: &[BlueprintItem],
        config: &LevelingConfig,
    ) -> Result<GapReport, ApiError> {
        analyze(self.store.as_ref(), exam_id, domains, blueprint, config).await
    }

    /// Generate the missing questions and return the report with `generated` counts.
    pub async fn execute(
        &self,
        exam_id: &str,
        domains: &[String],
        blueprint: &[BlueprintItem],
        config: &LevelingConfig,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<GapReport, ApiError> {
        self.executor
            .execute(
                self.store.as_ref(),
                self.generator.as_ref(),
                exam_id,
                domains,
                blueprint,
                config,
                on_progress,
            )
            .await
    }
}

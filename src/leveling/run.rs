//! Run entry point: resolve an exam record and configuration, then analyze or execute.

use crate::config::{validate_ratios, validate_target_total, LevelingSettings};
use crate::error::ApiError;
use crate::leveling::executor::{GapFillExecutor, ProgressCallback};
use crate::leveling::planner::{analyze, DifficultyRatios, GapReport, LevelingConfig};
use crate::provider::QuestionGenerator;
use crate::store::{ExamRecord, QuestionStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// One leveling run against a stored exam, with optional per-run overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelRequest {
    pub exam_id: String,
    #[serde(default)]
    pub target_total: Option<u64>,
    #[serde(default)]
    pub ratios: Option<DifficultyRatios>,
}

impl LevelRequest {
    pub fn new(exam_id: impl Into<String>) -> Self {
        Self {
            exam_id: exam_id.into(),
            ..Self::default()
        }
    }

    pub fn with_target_total(mut self, target_total: u64) -> Self {
        self.target_total = Some(target_total);
        self
    }

    pub fn with_ratios(mut self, ratios: DifficultyRatios) -> Self {
        self.ratios = Some(ratios);
        self
    }
}

/// Result of a run: the report plus planned/generated totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelOutcome {
    pub exam_id: String,
    pub config: LevelingConfig,
    pub report: GapReport,
    pub planned: u64,
    pub generated: u64,
}

impl LevelOutcome {
    fn from_report(exam_id: &str, config: LevelingConfig, report: GapReport) -> Self {
        Self {
            exam_id: exam_id.to_string(),
            config,
            planned: report.total_missing(),
            generated: report.total_generated(),
            report,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} questions generated out of {} planned",
            self.generated, self.planned
        )
    }
}

/// Load the exam and check that its domains and blueprint are usable.
pub async fn load_exam<S>(store: &S, exam_id: &str) -> Result<ExamRecord, ApiError>
where
    S: QuestionStore + ?Sized,
{
    let exam = store
        .get_exam(exam_id)
        .await?
        .ok_or_else(|| ApiError::ExamNotFound(exam_id.to_string()))?;
    validate_exam(&exam)?;
    Ok(exam)
}

/// Domains must be unique and non-blank; blueprint entries must name declared domains.
pub fn validate_exam(exam: &ExamRecord) -> Result<(), ApiError> {
    let mut seen = HashSet::new();
    for domain in &exam.domains {
        if domain.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "Exam {} declares a blank domain",
                exam.exam_id
            )));
        }
        if !seen.insert(domain.as_str()) {
            return Err(ApiError::InvalidInput(format!(
                "Exam {} declares domain '{}' more than once",
                exam.exam_id, domain
            )));
        }
    }
    for item in &exam.blueprint {
        if !exam.declares_domain(&item.domain) {
            return Err(ApiError::UnknownDomain {
                exam_id: exam.exam_id.clone(),
                domain: item.domain.clone(),
            });
        }
    }
    Ok(())
}

fn resolve_config(
    settings: &LevelingSettings,
    request: &LevelRequest,
) -> Result<LevelingConfig, ApiError> {
    let config = settings.leveling_config(request.target_total, request.ratios);
    validate_target_total(config.target_total).map_err(ApiError::InvalidInput)?;
    validate_ratios(&config.ratios).map_err(ApiError::InvalidInput)?;
    Ok(config)
}

/// Analyze a stored exam without generating anything.
pub async fn run_analyze<S>(
    store: &S,
    request: &LevelRequest,
    settings: &LevelingSettings,
) -> Result<LevelOutcome, ApiError>
where
    S: QuestionStore + ?Sized,
{
    let exam = load_exam(store, &request.exam_id).await?;
    let config = resolve_config(settings, request)?;
    let report = analyze(store, &exam.exam_id, &exam.domains, &exam.blueprint, &config).await?;
    Ok(LevelOutcome::from_report(&exam.exam_id, config, report))
}

/// Analyze and fill every gap of a stored exam.
pub async fn run_execute<S, G>(
    store: &S,
    generator: &G,
    request: &LevelRequest,
    settings: &LevelingSettings,
    on_progress: Option<ProgressCallback<'_>>,
) -> Result<LevelOutcome, ApiError>
where
    S: QuestionStore + ?Sized,
    G: QuestionGenerator + ?Sized,
{
    let exam = load_exam(store, &request.exam_id).await?;
    let config = resolve_config(settings, request)?;
    let executor = GapFillExecutor::with_batch_size(settings.batch_size);
    let report = executor
        .execute(
            store,
            generator,
            &exam.exam_id,
            &exam.domains,
            &exam.blueprint,
            &config,
            on_progress,
        )
        .await?;

    let outcome = LevelOutcome::from_report(&exam.exam_id, config, report);
    info!(
        exam_id = %outcome.exam_id,
        planned = outcome.planned,
        generated = outcome.generated,
        "Leveling run finished"
    );
    Ok(outcome)
}

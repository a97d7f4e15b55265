//! CLI route: single route table and run context. Dispatches to leveling services and presentation.

use crate::cli::parse::{Commands, ExamCommands, LevelOverrides, OutputFormat};
use crate::cli::presentation::{
    build_exam_inventory, format_analysis_json, format_analysis_text, format_exam_json,
    format_exam_text, format_level_summary,
};
use crate::config::{ConfigLoader, LevelerConfig};
use crate::error::ApiError;
use crate::leveling::run::validate_exam;
use crate::leveling::{run_analyze, run_execute, DifficultyRatios, LevelRequest};
use crate::provider::{GeneratorFactory, QuestionGenerator};
use crate::store::{ExamRecord, QuestionStore, SledQuestionStore};
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

/// Runtime context for CLI execution: workspace, loaded config, store and async runtime.
pub struct RunContext {
    config: LevelerConfig,
    workspace_root: PathBuf,
    store: SledQuestionStore,
    generator: Option<Arc<dyn QuestionGenerator>>,
    runtime: Runtime,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::with_config(workspace_root, config.validated()?)
    }

    /// Create run context from an already-loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: LevelerConfig) -> Result<Self, ApiError> {
        let store_path = config.storage.resolve_store_path(&workspace_root);
        std::fs::create_dir_all(&store_path)
            .map_err(|e| ApiError::StorageError(crate::error::StorageError::IoError(e)))?;
        let store = SledQuestionStore::new(&store_path)?;

        let runtime = Runtime::new()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))?;

        Ok(Self {
            config,
            workspace_root,
            store,
            generator: None,
            runtime,
        })
    }

    /// Use this generator instead of building one from `[provider]`.
    pub fn with_generator(mut self, generator: Arc<dyn QuestionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn config(&self) -> &LevelerConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let result = match command {
            Commands::Exam { command } => self.handle_exam_command(command),
            Commands::Analyze {
                exam_id,
                overrides,
                format,
            } => self.handle_analyze(exam_id, overrides, *format),
            Commands::Level {
                exam_id,
                overrides,
                yes,
            } => self.handle_level(exam_id, overrides, *yes),
        };
        self.store.flush()?;
        result
    }

    fn handle_exam_command(&self, command: &ExamCommands) -> Result<String, ApiError> {
        match command {
            ExamCommands::Import { file } => self.handle_exam_import(file),
            ExamCommands::Show { exam_id, format } => self.handle_exam_show(exam_id, *format),
            ExamCommands::Recount { exam_id } => {
                let count = self.runtime.block_on(async {
                    if self.store.get_exam(exam_id).await?.is_none() {
                        return Err(ApiError::ExamNotFound(exam_id.clone()));
                    }
                    Ok::<_, ApiError>(self.store.recount_questions(exam_id).await?)
                })?;
                Ok(format!("Exam {} holds {} questions", exam_id, count))
            }
        }
    }

    fn handle_exam_import(&self, file: &Path) -> Result<String, ApiError> {
        let contents = std::fs::read_to_string(file).map_err(|e| {
            ApiError::InvalidInput(format!("Failed to read {}: {}", file.display(), e))
        })?;
        let exam: ExamRecord = toml::from_str(&contents).map_err(|e| {
            ApiError::InvalidInput(format!("Invalid exam file {}: {}", file.display(), e))
        })?;
        validate_exam(&exam)?;

        let count = self.runtime.block_on(async {
            self.store.put_exam(&exam).await?;
            self.store.recount_questions(&exam.exam_id).await
        })?;
        info!(exam_id = %exam.exam_id, domains = exam.domains.len(), "Exam imported");

        Ok(format!(
            "Imported exam {} ({}) with {} domains; {} questions on record",
            exam.exam_id,
            exam.name,
            exam.domains.len(),
            count
        ))
    }

    fn handle_exam_show(&self, exam_id: &str, format: OutputFormat) -> Result<String, ApiError> {
        let (exam, questions) = self.runtime.block_on(async {
            let exam = self
                .store
                .get_exam(exam_id)
                .await?
                .ok_or_else(|| ApiError::ExamNotFound(exam_id.to_string()))?;
            let questions = self.store.questions_for_exam(exam_id).await?;
            Ok::<_, ApiError>((exam, questions))
        })?;
        let inventory = build_exam_inventory(exam, &questions);
        match format {
            OutputFormat::Json => format_exam_json(&inventory),
            OutputFormat::Text => Ok(format_exam_text(&inventory)),
        }
    }

    fn handle_analyze(
        &self,
        exam_id: &str,
        overrides: &LevelOverrides,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let request = self.build_request(exam_id, overrides);
        let outcome = self
            .runtime
            .block_on(run_analyze(&self.store, &request, &self.config.leveling))?;
        match format {
            OutputFormat::Json => format_analysis_json(&outcome),
            OutputFormat::Text => Ok(format_analysis_text(&outcome)),
        }
    }

    fn handle_level(
        &self,
        exam_id: &str,
        overrides: &LevelOverrides,
        yes: bool,
    ) -> Result<String, ApiError> {
        let request = self.build_request(exam_id, overrides);
        let analysis = self
            .runtime
            .block_on(run_analyze(&self.store, &request, &self.config.leveling))?;
        println!("{}", format_analysis_text(&analysis));
        if analysis.planned == 0 {
            return Ok("Nothing to generate.".to_string());
        }

        if !yes {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Generate {} questions for exam '{}'?",
                    analysis.planned, exam_id
                ))
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Leveling cancelled".to_string());
            }
        }

        let generator = match &self.generator {
            Some(generator) => Arc::clone(generator),
            None => GeneratorFactory::create(&self.config.provider)?,
        };
        let on_progress = |line: &str| println!("{}", line.dimmed());
        let outcome = self.runtime.block_on(run_execute(
            &self.store,
            generator.as_ref(),
            &request,
            &self.config.leveling,
            Some(&on_progress),
        ))?;

        Ok(format_level_summary(&outcome))
    }

    fn build_request(&self, exam_id: &str, overrides: &LevelOverrides) -> LevelRequest {
        let defaults = self.config.leveling.ratios;
        let ratios = if overrides.easy.is_some()
            || overrides.medium.is_some()
            || overrides.hard.is_some()
        {
            Some(DifficultyRatios::new(
                overrides.easy.unwrap_or(defaults.easy),
                overrides.medium.unwrap_or(defaults.medium),
                overrides.hard.unwrap_or(defaults.hard),
            ))
        } else {
            None
        };
        LevelRequest {
            exam_id: exam_id.to_string(),
            target_total: overrides.target,
            ratios,
        }
    }
}

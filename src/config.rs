//! Configuration System
//!
//! Layered configuration: built-in defaults, the user config file, the workspace
//! `config/` directory and finally `LEVELER__*` environment variables.

mod loader;

pub use crate::logging::LoggingConfig;
pub use crate::provider::{ProviderConfig, ProviderType};
pub use loader::ConfigLoader;

use crate::error::ApiError;
use crate::leveling::allocation::MAX_EXACT_TOTAL;
use crate::leveling::{DifficultyRatios, LevelingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelerConfig {
    /// Defaults for leveling runs
    #[serde(default)]
    pub leveling: LevelingSettings,

    /// Question generator
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Storage paths
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Leveling defaults; CLI flags override them per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelingSettings {
    #[serde(default = "default_target_total")]
    pub target_total: u64,

    #[serde(default)]
    pub ratios: DifficultyRatios,

    /// Largest count requested from the generator per call
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

fn default_target_total() -> u64 {
    200
}

fn default_batch_size() -> u64 {
    5
}

impl Default for LevelingSettings {
    fn default() -> Self {
        Self {
            target_total: default_target_total(),
            ratios: DifficultyRatios::default(),
            batch_size: default_batch_size(),
        }
    }
}

impl LevelingSettings {
    /// Build the run configuration, applying per-run overrides
    pub fn leveling_config(
        &self,
        target_total: Option<u64>,
        ratios: Option<DifficultyRatios>,
    ) -> LevelingConfig {
        LevelingConfig {
            target_total: target_total.unwrap_or(self.target_total),
            ratios: ratios.unwrap_or(self.ratios),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        validate_target_total(self.target_total)?;
        validate_ratios(&self.ratios)
    }
}

/// Targets above 2^53 cannot be apportioned exactly in `f64`
pub fn validate_target_total(target_total: u64) -> Result<(), String> {
    if target_total > MAX_EXACT_TOTAL {
        return Err(format!(
            "target_total must be at most {}, got {}",
            MAX_EXACT_TOTAL, target_total
        ));
    }
    Ok(())
}

/// Ratios must be finite and non-negative
pub fn validate_ratios(ratios: &DifficultyRatios) -> Result<(), String> {
    for (name, value) in [
        ("easy", ratios.easy),
        ("medium", ratios.medium),
        ("hard", ratios.hard),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!(
                "ratio '{}' must be a non-negative number, got {}",
                name, value
            ));
        }
    }
    Ok(())
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory; relative paths resolve against the workspace root
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the store directory for a workspace.
    ///
    /// Without an explicit path the store lives in `<workspace>/.leveler/store`.
    pub fn resolve_store_path(&self, workspace_root: &Path) -> PathBuf {
        match &self.store_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => workspace_root.join(path),
            None => workspace_root.join(".leveler").join("store"),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Leveling(String),
    Provider(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Leveling(msg) => write!(f, "Leveling: {}", msg),
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl LevelerConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.leveling.validate() {
            errors.push(ValidationError::Leveling(e));
        }
        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one error
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }
}

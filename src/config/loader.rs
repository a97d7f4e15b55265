//! Layered config loading.
//!
//! Precedence (lowest to highest): built-in defaults, the user config file
//! (`<config dir>/leveler/config.toml`), workspace `config/config.toml`, workspace
//! `config/{LEVELER_ENV}.toml`, then `LEVELER__SECTION__KEY` environment variables.

use crate::config::LevelerConfig;
use crate::error::ApiError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace from every layer.
    pub fn load(workspace_root: &Path) -> Result<LevelerConfig, ApiError> {
        let mut builder = builder_with_defaults()?;
        if let Some(path) = user_config_path() {
            builder = add_file(builder, &path);
        }
        builder = add_workspace_files(builder, workspace_root);
        Self::finish(builder)
    }

    /// Load an explicit file in place of the user and workspace layers.
    pub fn load_from_file(path: &Path) -> Result<LevelerConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<LevelerConfig, ApiError> {
        let config = builder
            .add_source(
                Environment::with_prefix("LEVELER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<LevelerConfig>()?;
        Ok(config)
    }
}

/// Create a Config builder with the leveling defaults applied.
fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("leveling.target_total", 200)?
        .set_default("leveling.ratios.easy", 0.10)?
        .set_default("leveling.ratios.medium", 0.45)?
        .set_default("leveling.ratios.hard", 0.45)?
        .set_default("leveling.batch_size", 5)
}

/// Path to the per-user config file, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "leveler").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn add_file(builder: ConfigBuilder<DefaultState>, path: &Path) -> ConfigBuilder<DefaultState> {
    if path.exists() {
        debug!(config_path = %path.display(), "Loading config file");
        builder.add_source(File::from(path).required(false))
    } else {
        builder
    }
}

fn add_workspace_files(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var("LEVELER_ENV").unwrap_or_else(|_| "development".to_string());

    let builder = add_file(builder, &config_dir.join("config.toml"));
    add_file(builder, &config_dir.join(format!("{}.toml", env_name)))
}

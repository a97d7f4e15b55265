//! CLI parse: clap types for the leveler. No behavior; definitions only.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Leveler CLI - keep exam question banks balanced by domain and difficulty
#[derive(Parser)]
#[command(name = "leveler")]
#[command(about = "Analyze and fill per-domain, per-difficulty gaps in exam question banks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage exam records
    Exam {
        #[command(subcommand)]
        command: ExamCommands,
    },
    /// Show the gap report for an exam without generating anything
    Analyze {
        /// Exam identifier
        exam_id: String,
        #[command(flatten)]
        overrides: LevelOverrides,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Analyze, confirm, then generate the missing questions
    Level {
        /// Exam identifier
        exam_id: String,
        #[command(flatten)]
        overrides: LevelOverrides,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ExamCommands {
    /// Create or replace an exam record from a TOML file
    Import {
        /// TOML file with exam_id, name, domains and optional [[blueprint]] entries
        file: PathBuf,
    },
    /// Show an exam record and its inventory per domain and difficulty
    Show {
        /// Exam identifier
        exam_id: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Recompute the stored question counter from the actual questions
    Recount {
        /// Exam identifier
        exam_id: String,
    },
}

/// Rendering of command output
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Per-run overrides of the configured leveling defaults
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct LevelOverrides {
    /// Target question total for the exam
    #[arg(long)]
    pub target: Option<u64>,
    /// Easy ratio (unset ratios keep their configured value)
    #[arg(long)]
    pub easy: Option<f64>,
    /// Medium ratio
    #[arg(long)]
    pub medium: Option<f64>,
    /// Hard ratio
    #[arg(long)]
    pub hard: Option<f64>,
}

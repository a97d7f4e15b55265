//! CLI domain: parse, route, output, and presentation only.
//! No leveling logic; the route table dispatches to the leveling services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ExamCommands, LevelOverrides, OutputFormat};
pub use presentation::{
    build_exam_inventory, format_analysis_json, format_analysis_text, format_exam_json,
    format_exam_text, format_gap_table, format_level_summary, DomainInventory, ExamInventory,
};
pub use route::RunContext;

//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output, with a hint where one helps.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ExamNotFound(exam_id) => format!(
            "{}\nImport it first: leveler exam import <file.toml> (exam_id = \"{}\")",
            e, exam_id
        ),
        ApiError::ProviderNotConfigured(_) => format!(
            "{}\nConfigure [provider] in config/config.toml or set LEVELER__PROVIDER__API_KEY",
            e
        ),
        _ => e.to_string(),
    }
}

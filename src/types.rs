//! Core identifiers and value types shared by the planner, executor and stores.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exam identifier (document id in the `exams` collection)
pub type ExamID = String;

/// Question difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Natural bucket order used by the planner and the executor.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!(
                "Unknown difficulty '{}' (expected Easy, Medium or Hard)",
                other
            )),
        }
    }
}

/// Intended share of an exam's questions for one domain.
///
/// Weights are relative; they do not need to sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintItem {
    pub domain: String,
    pub weight: f64,
}

impl BlueprintItem {
    pub fn new(domain: impl Into<String>, weight: f64) -> Self {
        Self {
            domain: domain.into(),
            weight,
        }
    }
}

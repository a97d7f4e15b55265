//! CLI presentation: text and JSON rendering of exams, gap reports and run outcomes.

use crate::error::ApiError;
use crate::leveling::{GapReport, LevelOutcome};
use crate::store::{ExamRecord, QuestionRecord};
use crate::types::Difficulty;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Question counts for one domain, by difficulty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainInventory {
    pub domain: String,
    pub declared: bool,
    pub easy: u64,
    pub medium: u64,
    pub hard: u64,
}

impl DomainInventory {
    pub fn total(&self) -> u64 {
        self.easy + self.medium + self.hard
    }
}

/// Exam record plus its current inventory, as shown by `exam show`
#[derive(Debug, Clone, Serialize)]
pub struct ExamInventory {
    pub exam: ExamRecord,
    pub actual_total: u64,
    pub domains: Vec<DomainInventory>,
}

/// Count questions per domain and difficulty.
///
/// Declared domains come first in declaration order; undeclared ones follow in the
/// order they are first seen.
pub fn build_exam_inventory(exam: ExamRecord, questions: &[QuestionRecord]) -> ExamInventory {
    let mut domains: Vec<DomainInventory> = exam
        .domains
        .iter()
        .map(|domain| DomainInventory {
            domain: domain.clone(),
            declared: true,
            easy: 0,
            medium: 0,
            hard: 0,
        })
        .collect();

    for question in questions {
        let index = match domains.iter().position(|d| d.domain == question.domain) {
            Some(index) => index,
            None => {
                domains.push(DomainInventory {
                    domain: question.domain.clone(),
                    declared: false,
                    easy: 0,
                    medium: 0,
                    hard: 0,
                });
                domains.len() - 1
            }
        };
        let row = &mut domains[index];
        match question.difficulty {
            Difficulty::Easy => row.easy += 1,
            Difficulty::Medium => row.medium += 1,
            Difficulty::Hard => row.hard += 1,
        }
    }

    ExamInventory {
        exam,
        actual_total: questions.len() as u64,
        domains,
    }
}

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_exam_text(inventory: &ExamInventory) -> String {
    let exam = &inventory.exam;
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("{} ({})", exam.name, exam.exam_id))
    ));
    out.push_str(&format!("  Stored question count: {}\n", exam.question_count));
    out.push_str(&format!("  Actual questions: {}\n", inventory.actual_total));
    if exam.question_count != inventory.actual_total {
        out.push_str(&format!(
            "  {}\n",
            "Counter differs from the actual total; run `leveler exam recount`.".yellow()
        ));
    }
    out.push('\n');

    if !exam.blueprint.is_empty() {
        out.push_str(&format!("{}\n\n", format_section_heading("Blueprint")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Domain", "Weight"]);
        for item in &exam.blueprint {
            table.add_row(vec![item.domain.clone(), item.weight.to_string()]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    out.push_str(&format!("{}\n\n", format_section_heading("Inventory")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Domain", "Easy", "Medium", "Hard", "Total"]);
    for row in &inventory.domains {
        let domain = if row.declared {
            row.domain.clone()
        } else {
            format!("{} (undeclared)", row.domain)
        };
        table.add_row(vec![
            domain,
            row.easy.to_string(),
            row.medium.to_string(),
            row.hard.to_string(),
            row.total().to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_exam_json(inventory: &ExamInventory) -> Result<String, ApiError> {
    serde_json::to_string_pretty(inventory)
        .map_err(|e| ApiError::InvalidInput(format!("Failed to serialize exam: {}", e)))
}

/// Gap table; the Generated column appears once a run has executed.
pub fn format_gap_table(report: &GapReport, include_generated: bool) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    let mut header = vec!["Domain", "Difficulty", "Current", "Target", "Missing"];
    if include_generated {
        header.push("Generated");
    }
    table.set_header(header);
    for entry in &report.entries {
        let mut row = vec![
            entry.domain.clone(),
            entry.difficulty.to_string(),
            entry.current.to_string(),
            entry.target.to_string(),
            entry.gap().to_string(),
        ];
        if include_generated {
            row.push(entry.generated.to_string());
        }
        table.add_row(row);
    }
    table.to_string()
}

pub fn format_analysis_text(outcome: &LevelOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Leveling analysis: {}", outcome.exam_id))
    ));
    out.push_str(&format!(
        "  Target total: {}  (easy {} / medium {} / hard {})\n\n",
        outcome.config.target_total,
        outcome.config.ratios.easy,
        outcome.config.ratios.medium,
        outcome.config.ratios.hard
    ));
    if outcome.report.is_empty() {
        out.push_str("  Exam declares no domains; nothing to level.\n");
        return out;
    }
    out.push_str(&format!("{}\n\n", format_gap_table(&outcome.report, false)));
    if outcome.planned == 0 {
        out.push_str(&format!("{}\n", "Exam is already leveled.".green()));
    } else {
        out.push_str(&format!(
            "Total missing: {}\n",
            outcome.planned.to_string().bold()
        ));
    }
    out
}

pub fn format_analysis_json(outcome: &LevelOutcome) -> Result<String, ApiError> {
    serde_json::to_string_pretty(outcome)
        .map_err(|e| ApiError::InvalidInput(format!("Failed to serialize report: {}", e)))
}

pub fn format_level_summary(outcome: &LevelOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_gap_table(&outcome.report, true)));
    let headline = format!("Generated {} new questions", outcome.generated);
    if outcome.generated < outcome.planned {
        out.push_str(&format!("{}\n", headline.yellow()));
    } else {
        out.push_str(&format!("{}\n", headline.green()));
    }
    out.push_str(&format!("  {}\n", outcome.summary()));
    out
}

//! Allocation planner: per-(domain, difficulty) targets and gaps for an exam.
//!
//! Domain targets split the global target by blueprint weight, difficulty targets split
//! each domain target by ratio, both with the Largest Remainder Method. Gaps are then
//! clamped so the run never adds more than `target_total - current_total` questions.

use crate::error::ApiError;
use crate::leveling::allocation::largest_remainder;
use crate::store::{QuestionRecord, QuestionStore};
use crate::types::{BlueprintItem, Difficulty};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Desired difficulty mix as relative weights (conventionally fractions summing to 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRatios {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl DifficultyRatios {
    pub fn new(easy: f64, medium: f64, hard: f64) -> Self {
        Self { easy, medium, hard }
    }

    pub fn weight(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    /// Weights in `Difficulty::ALL` order
    pub fn weights(&self) -> [f64; 3] {
        [self.easy, self.medium, self.hard]
    }
}

impl Default for DifficultyRatios {
    fn default() -> Self {
        Self {
            easy: 0.10,
            medium: 0.45,
            hard: 0.45,
        }
    }
}

/// Global question target and difficulty mix for one leveling run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelingConfig {
    pub target_total: u64,
    pub ratios: DifficultyRatios,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            target_total: 200,
            ratios: DifficultyRatios::default(),
        }
    }
}

/// Ideal (pre-clamp) targets for one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAllocation {
    pub domain: String,
    pub target: u64,
    /// Targets in `Difficulty::ALL` order; always sums to `target`
    pub difficulty_targets: [u64; 3],
}

/// Ideal targets before inventory is taken into account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub target_total: u64,
    pub domains: Vec<DomainAllocation>,
}

impl AllocationPlan {
    pub fn domain_target_sum(&self) -> u64 {
        self.domains.iter().map(|d| d.target).sum()
    }
}

/// One (domain, difficulty) bucket of a gap report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapEntry {
    pub domain: String,
    pub difficulty: Difficulty,
    pub current: u64,
    pub target: u64,
    pub generated: u64,
}

impl GapEntry {
    /// Questions the plan asks for in this bucket
    pub fn gap(&self) -> u64 {
        self.target.saturating_sub(self.current)
    }

    /// Questions still missing after what the executor generated
    pub fn remaining(&self) -> u64 {
        self.gap().saturating_sub(self.generated)
    }
}

/// Per-bucket report; recomputed on every analysis and never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    pub entries: Vec<GapEntry>,
}

impl GapReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Buckets with `current < target`
    pub fn gaps(&self) -> impl Iterator<Item = &GapEntry> {
        self.entries.iter().filter(|e| e.current < e.target)
    }

    pub fn has_gaps(&self) -> bool {
        self.gaps().next().is_some()
    }

    pub fn total_missing(&self) -> u64 {
        self.entries.iter().map(GapEntry::gap).sum()
    }

    pub fn total_generated(&self) -> u64 {
        self.entries.iter().map(|e| e.generated).sum()
    }

    pub fn entry(&self, domain: &str, difficulty: Difficulty) -> Option<&GapEntry> {
        self.entries
            .iter()
            .find(|e| e.domain == domain && e.difficulty == difficulty)
    }
}

/// Weight for each domain, looked up in the blueprint (first match wins, missing = 0).
fn domain_weights(domains: &[String], blueprint: &[BlueprintItem]) -> Vec<f64> {
    domains
        .iter()
        .map(|domain| {
            blueprint
                .iter()
                .find(|item| &item.domain == domain)
                .map(|item| item.weight)
                .unwrap_or(0.0)
        })
        .collect()
}

/// Compute ideal domain and difficulty targets for `config.target_total`.
pub fn allocate(
    domains: &[String],
    blueprint: &[BlueprintItem],
    config: &LevelingConfig,
) -> AllocationPlan {
    let weights = domain_weights(domains, blueprint);
    let domain_targets = largest_remainder(config.target_total, &weights);
    let ratio_weights = config.ratios.weights();

    let domains = domains
        .iter()
        .zip(domain_targets)
        .map(|(domain, target)| {
            let split = largest_remainder(target, &ratio_weights);
            DomainAllocation {
                domain: domain.clone(),
                target,
                difficulty_targets: [split[0], split[1], split[2]],
            }
        })
        .collect();

    AllocationPlan {
        target_total: config.target_total,
        domains,
    }
}

/// Build the gap report for an allocation against existing inventory.
///
/// Clamping walks buckets in report order (domain order, then Easy, Medium, Hard) and
/// hands the remaining global budget out first-come-first-served.
pub fn plan_gaps(plan: &AllocationPlan, questions: &[QuestionRecord]) -> GapReport {
    let current_total = questions.len() as u64;
    let global_remaining = plan.target_total.saturating_sub(current_total);

    let mut counts: HashMap<(&str, Difficulty), u64> = HashMap::new();
    for question in questions {
        *counts
            .entry((question.domain.as_str(), question.difficulty))
            .or_default() += 1;
    }

    let mut entries = Vec::with_capacity(plan.domains.len() * Difficulty::ALL.len());
    for allocation in &plan.domains {
        for (difficulty, target) in Difficulty::ALL.iter().zip(allocation.difficulty_targets) {
            let current = counts
                .get(&(allocation.domain.as_str(), *difficulty))
                .copied()
                .unwrap_or(0);
            entries.push(GapEntry {
                domain: allocation.domain.clone(),
                difficulty: *difficulty,
                current,
                target,
                generated: 0,
            });
        }
    }

    let total_gap: u64 = entries.iter().map(GapEntry::gap).sum();
    if total_gap > global_remaining {
        warn!(
            total_gap,
            global_remaining, current_total, "Ideal gaps exceed allowance; clamping"
        );
        let mut allowed = 0u64;
        for entry in &mut entries {
            let gap = entry.gap();
            if gap > 0 && allowed < global_remaining {
                let take = gap.min(global_remaining - allowed);
                entry.target = entry.current + take;
                allowed += take;
            } else {
                entry.target = entry.current;
            }
        }
    }

    GapReport { entries }
}

/// Analyze an exam: read its inventory and compute the clamped gap report.
///
/// Returns an empty report without touching the store when `domains` is empty.
pub async fn analyze<S>(
    store: &S,
    exam_id: &str,
    domains: &[String],
    blueprint: &[BlueprintItem],
    config: &LevelingConfig,
) -> Result<GapReport, ApiError>
where
    S: QuestionStore + ?Sized,
{
    if domains.is_empty() {
        return Ok(GapReport::default());
    }

    let questions = store.questions_for_exam(exam_id).await?;
    let undeclared = questions
        .iter()
        .filter(|q| !domains.iter().any(|d| d == &q.domain))
        .count();
    if undeclared > 0 {
        warn!(
            exam_id,
            undeclared, "Questions with undeclared domains count toward the total only"
        );
    }

    let plan = allocate(domains, blueprint, config);
    let report = plan_gaps(&plan, &questions);
    debug!(
        exam_id,
        current_total = questions.len(),
        target_total = config.target_total,
        missing = report.total_missing(),
        "Leveling analysis complete"
    );
    Ok(report)
}

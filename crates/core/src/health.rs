//! Retention health per stage.
//!
//! A stage with no records has no health (`None`), which presentation must
//! show as "no data" rather than 0%.

use serde::Serialize;

use crate::model::{PageNumber, Section, SessionRecord, Stage};
use crate::window::JuzhaliRange;

//
// ─── TIERS ─────────────────────────────────────────────────────────────────────
//

/// Display tier for a health percentage. Plain thresholds, no hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTier {
    Excellent,
    Good,
    NeedsAttention,
    Critical,
}

impl HealthTier {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            HealthTier::Excellent
        } else if score >= 60.0 {
            HealthTier::Good
        } else if score >= 40.0 {
            HealthTier::NeedsAttention
        } else {
            HealthTier::Critical
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HealthTier::Excellent => "excellent",
            HealthTier::Good => "good",
            HealthTier::NeedsAttention => "needs-attention",
            HealthTier::Critical => "critical",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            HealthTier::Excellent => "Excellent retention",
            HealthTier::Good => "Good progress",
            HealthTier::NeedsAttention => "Needs attention",
            HealthTier::Critical => "Critical - requires focus",
        }
    }
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// Which rule produced a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBasis {
    /// Mean of `Session_Summary` grades.
    SummaryGrades,
    /// `1 - major / (major + minor)` over tracked page entries.
    MistakeRatio,
    /// Mean of per-record grades; marks-only history with no summaries.
    RecordGrades,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageHealth {
    pub stage: Stage,
    /// Percentage in `0.0..=100.0`.
    pub score: f64,
    pub tier: HealthTier,
    pub basis: HealthBasis,
    /// Records that contributed to the score.
    pub sample_size: usize,
}

/// Health percentage of a stage; `None` when the stage has no records.
#[must_use]
pub fn stage_health(history: &[SessionRecord], stage: Stage) -> Option<f64> {
    stage_report(history, stage).map(|h| h.score)
}

/// Health of a stage with its tier and basis.
#[must_use]
pub fn stage_report(history: &[SessionRecord], stage: Stage) -> Option<StageHealth> {
    let records: Vec<&SessionRecord> = history.iter().filter(|r| r.stage == stage).collect();
    score_records(stage, &records)
}

/// Health of `stage` restricted to the pages of the Juzhali window.
///
/// Page entries count when they test a single page inside the window;
/// summaries count when any page they list is inside it.
#[must_use]
pub fn window_report(
    history: &[SessionRecord],
    stage: Stage,
    window: &JuzhaliRange,
) -> Option<StageHealth> {
    let records: Vec<&SessionRecord> = history
        .iter()
        .filter(|r| r.stage == stage)
        .filter(|r| {
            if r.is_session_summary() {
                r.page
                    .as_ref()
                    .is_some_and(|p| p.pages().iter().any(|page| window.contains(*page)))
            } else {
                r.single_page().is_some_and(|page| window.contains(page))
            }
        })
        .collect();
    score_records(stage, &records)
}

/// Murajaat health of one section.
#[must_use]
pub fn section_report(history: &[SessionRecord], section: Section) -> Option<StageHealth> {
    let in_section = |page: PageNumber| page.section() == section;
    let records: Vec<&SessionRecord> = history
        .iter()
        .filter(|r| r.stage == Stage::Murajaat)
        .filter(|r| {
            r.section == Some(section)
                || r.page
                    .as_ref()
                    .is_some_and(|p| p.first().is_some_and(in_section))
        })
        .collect();
    score_records(Stage::Murajaat, &records)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    Some(values.iter().sum::<f64>() / n)
}

fn report(stage: Stage, score: f64, basis: HealthBasis, sample_size: usize) -> StageHealth {
    let score = score.clamp(0.0, 100.0);
    StageHealth {
        stage,
        score,
        tier: HealthTier::from_score(score),
        basis,
        sample_size,
    }
}

fn score_records(stage: Stage, records: &[&SessionRecord]) -> Option<StageHealth> {
    if records.is_empty() {
        return None;
    }

    let summaries: Vec<&SessionRecord> = records
        .iter()
        .copied()
        .filter(|r| r.is_session_summary() && r.overall_grade.is_some())
        .collect();
    if !summaries.is_empty() {
        let grades: Vec<f64> = summaries.iter().filter_map(|r| r.normalized_grade()).collect();
        let Some(avg) = mean(&grades) else {
            log::debug!(
                "{stage}: {} summary grades present but none could be normalized",
                summaries.len()
            );
            return None;
        };
        return Some(report(stage, avg * 10.0, HealthBasis::SummaryGrades, grades.len()));
    }

    let per_page: Vec<&SessionRecord> = records
        .iter()
        .copied()
        .filter(|r| !r.is_session_summary())
        .collect();
    let tracked: Vec<&SessionRecord> = per_page
        .iter()
        .copied()
        .filter(|r| r.tracks_mistakes())
        .collect();

    if tracked.is_empty() {
        let grades: Vec<f64> = per_page.iter().filter_map(|r| r.normalized_grade()).collect();
        if let Some(avg) = mean(&grades) {
            return Some(report(stage, avg * 10.0, HealthBasis::RecordGrades, grades.len()));
        }
    }

    let major: u64 = tracked
        .iter()
        .map(|r| u64::from(r.major_mistakes.unwrap_or(0)))
        .sum();
    let minor: u64 = tracked
        .iter()
        .map(|r| u64::from(r.minor_mistakes.unwrap_or(0)))
        .sum();
    let total = major + minor;
    // no mistakes recorded reads as a perfect score
    #[allow(clippy::cast_precision_loss)]
    let score = if total == 0 {
        100.0
    } else {
        100.0 * (1.0 - major as f64 / total as f64)
    };
    Some(report(stage, score, HealthBasis::MistakeRatio, tracked.len()))
}

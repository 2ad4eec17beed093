//! Composite stability scoring and letter grading
//!
//! Folds pass rate, flakiness, and duration variability into one weighted
//! 0-100 score so a dashboard can rank tests by how much they can be
//! trusted.

use crate::config::AnalyticsConfig;
use crate::flakiness::classify_flakiness;
use crate::model::TestStatus;
use crate::statistics::duration_cv_percent;
use crate::store::BoundedHistoryStore;
use serde::{Deserialize, Serialize};

/// Component weights of the composite score; must sum to 1
const PASS_RATE_WEIGHT: f32 = 0.5;
const FLAKINESS_WEIGHT: f32 = 0.3;
const DURATION_WEIGHT: f32 = 0.2;

/// Letter grade summarizing a test's stability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl StabilityGrade {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
            Self::NotApplicable => "N/A",
        }
    }
}

impl std::fmt::Display for StabilityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Stability assessment for one test signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    pub signature: String,
    pub grade: StabilityGrade,
    /// Weighted composite score, 0-100
    pub score: f32,
    /// Percentage of runs that passed
    pub pass_rate: f32,
    pub flakiness_percent: u32,
    /// Duration coefficient of variation in percent, capped at 100
    pub duration_cv: f32,
    pub total_runs: usize,
}

/// Score a test's stability from its full run history
///
/// Requires `min_runs_stability` runs; below that the grade is `N/A` and
/// the score 0 (not an error state).
#[must_use]
pub fn score_stability(
    store: &BoundedHistoryStore,
    signature: &str,
    config: &AnalyticsConfig,
) -> StabilityReport {
    let history = store.history(signature);
    let total_runs = history.len();

    if total_runs < config.min_runs_stability {
        return StabilityReport {
            signature: signature.to_string(),
            grade: StabilityGrade::NotApplicable,
            score: 0.0,
            pass_rate: 0.0,
            flakiness_percent: 0,
            duration_cv: 0.0,
            total_runs,
        };
    }

    let passed = history
        .iter()
        .filter(|o| o.status == TestStatus::Passed)
        .count();
    let pass_rate = 100.0 * passed as f32 / total_runs as f32;

    let flakiness_percent = classify_flakiness(store, signature, config).percent;

    let durations: Vec<f32> = history.iter().map(|o| o.duration_ms as f32).collect();
    let duration_cv = duration_cv_percent(&durations);

    let score = composite_score(pass_rate, flakiness_percent, duration_cv);

    StabilityReport {
        signature: signature.to_string(),
        grade: grade_for(score),
        score,
        pass_rate,
        flakiness_percent,
        duration_cv,
        total_runs,
    }
}

/// Weighted composite of the three stability components, clamped to 0-100
#[must_use]
pub fn composite_score(pass_rate: f32, flakiness_percent: u32, duration_cv: f32) -> f32 {
    let raw = pass_rate * PASS_RATE_WEIGHT
        + (100.0 - flakiness_percent as f32) * FLAKINESS_WEIGHT
        + (100.0 - duration_cv) * DURATION_WEIGHT;
    raw.clamp(0.0, 100.0)
}

/// Map a composite score to its letter grade
#[must_use]
pub fn grade_for(score: f32) -> StabilityGrade {
    if score >= 95.0 {
        StabilityGrade::APlus
    } else if score >= 90.0 {
        StabilityGrade::A
    } else if score >= 80.0 {
        StabilityGrade::B
    } else if score >= 70.0 {
        StabilityGrade::C
    } else if score >= 60.0 {
        StabilityGrade::D
    } else {
        StabilityGrade::F
    }
}

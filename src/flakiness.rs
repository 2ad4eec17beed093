//! Flakiness classification over a test's recent run history
//!
//! A test is flaky when its pass/fail outcome oscillates across runs that
//! should be equivalent. The score is the ratio of observed status
//! transitions to possible transitions, damped when the failures all share
//! one error message (consistent errors point at a real defect, not
//! nondeterminism).

use crate::config::AnalyticsConfig;
use crate::model::{TestOutcome, TestStatus, NO_ERROR_SENTINEL};
use crate::store::BoundedHistoryStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Multiplier applied to the transition score when failures are consistent
const ERROR_CONSISTENCY_DAMPING: f64 = 0.5;

/// Window inspected for the new-failure pattern (3 passes then a failure)
const NEW_FAILURE_WINDOW: usize = 4;

/// Verdict of the flakiness classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlakinessStatus {
    /// Transition score at or above the flaky threshold
    Flaky,
    /// No meaningful oscillation observed
    Stable,
    /// Latest run failed after a streak of passes
    NewFailure,
    /// Fewer runs than the minimum needed for a verdict
    InsufficientData,
}

/// Flakiness classification for one test signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlakinessReport {
    pub signature: String,
    pub status: FlakinessStatus,
    /// Rounded transition score in percent (0-100)
    pub percent: u32,
    pub total_runs: usize,
    /// Pass/fail flips observed in chronological order
    pub status_changes: usize,
    /// Whether one error message dominates the failures
    pub has_consistent_errors: bool,
}

/// Classify a test's recent behavior as flaky / stable / new failure
///
/// Pure function of the store contents. Outcomes are walked in
/// chronological (`started_at`) order; skipped and broken executions are
/// invisible to the transition walk.
#[must_use]
pub fn classify_flakiness(
    store: &BoundedHistoryStore,
    signature: &str,
    config: &AnalyticsConfig,
) -> FlakinessReport {
    let history = store.history(signature);
    let total_runs = history.len();

    if total_runs < config.min_runs_flakiness {
        return FlakinessReport {
            signature: signature.to_string(),
            status: FlakinessStatus::InsufficientData,
            percent: 0,
            total_runs,
            status_changes: 0,
            has_consistent_errors: false,
        };
    }

    let mut outcomes: Vec<&TestOutcome> = history.iter().collect();
    outcomes.sort_by_key(|o| o.started_at);

    let status_changes = count_status_changes(&outcomes);
    let has_consistent_errors = has_consistent_errors(&outcomes, config);

    // The denominator deliberately stays total_runs - 1 even though the
    // transition walk ignores skipped/broken runs, which damps the
    // percentage when skips are frequent. Do not "fix" without changing
    // every downstream threshold.
    let possible_transitions = total_runs - 1;
    let mut base_score = if possible_transitions > 0 {
        status_changes as f64 / possible_transitions as f64
    } else {
        0.0
    };
    if has_consistent_errors {
        base_score *= ERROR_CONSISTENCY_DAMPING;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (base_score * 100.0).round() as u32;

    let status = if percent >= config.flaky_threshold_percent {
        FlakinessStatus::Flaky
    } else if is_new_failure(&outcomes) {
        FlakinessStatus::NewFailure
    } else {
        FlakinessStatus::Stable
    };

    FlakinessReport {
        signature: signature.to_string(),
        status,
        percent,
        total_runs,
        status_changes,
        has_consistent_errors,
    }
}

/// Count pass/fail flips, skipping inconclusive outcomes entirely
fn count_status_changes(outcomes: &[&TestOutcome]) -> usize {
    let mut changes = 0;
    let mut previous: Option<TestStatus> = None;

    for outcome in outcomes {
        if !outcome.status.is_conclusive() {
            continue;
        }
        if let Some(prev) = previous {
            if prev != outcome.status {
                changes += 1;
            }
        }
        previous = Some(outcome.status);
    }

    changes
}

/// Whether one error message prefix accounts for most of the failures
fn has_consistent_errors(outcomes: &[&TestOutcome], config: &AnalyticsConfig) -> bool {
    let mut groups: HashMap<String, usize> = HashMap::new();
    let mut failed_count = 0usize;

    for outcome in outcomes {
        if outcome.status != TestStatus::Failed {
            continue;
        }
        failed_count += 1;

        let key = outcome.error_message.as_deref().map_or_else(
            || NO_ERROR_SENTINEL.to_string(),
            |msg| msg.chars().take(config.error_prefix_len).collect(),
        );
        *groups.entry(key).or_insert(0) += 1;
    }

    if failed_count == 0 {
        return false;
    }

    let largest = groups.values().copied().max().unwrap_or(0);
    let consistency_ratio = largest as f64 / failed_count as f64;
    consistency_ratio > config.error_consistency_ratio
}

/// Latest run failed right after a streak of passes
fn is_new_failure(outcomes: &[&TestOutcome]) -> bool {
    if outcomes.len() < NEW_FAILURE_WINDOW {
        return false;
    }

    let tail = &outcomes[outcomes.len() - NEW_FAILURE_WINDOW..];
    tail[NEW_FAILURE_WINDOW - 1].status == TestStatus::Failed
        && tail[..NEW_FAILURE_WINDOW - 1]
            .iter()
            .all(|o| o.status == TestStatus::Passed)
}

//! Severity-ordered alert feed over every known test
//!
//! One pass over the store's test records merges the flakiness and
//! duration-regression signals into a single feed: errors first, then
//! warnings, each class keeping the per-test scan order. The partition is
//! explicit (two vectors, concatenated) rather than a sort, so ordering
//! does not depend on sort stability.

use crate::config::AnalyticsConfig;
use crate::flakiness::{classify_flakiness, FlakinessStatus};
use crate::regression::{detect_regression, RegressionReport};
use crate::store::BoundedHistoryStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    FlakyWarning,
    NewFailure,
    PerformanceRegression,
}

/// One actionable finding about a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub signature: String,
    pub title: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    /// Full statistics for performance regressions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regression: Option<RegressionReport>,
}

/// Collect the alert feed for every test the store knows about
///
/// A test can contribute at most one flakiness-derived alert (flaky
/// outranks new-failure) plus one performance regression alert.
#[must_use]
pub fn collect_alerts(store: &BoundedHistoryStore, config: &AnalyticsConfig) -> Vec<Alert> {
    let mut errors: Vec<Alert> = Vec::new();
    let mut warnings: Vec<Alert> = Vec::new();

    for record in store.records() {
        let flakiness = classify_flakiness(store, &record.signature, config);
        match flakiness.status {
            FlakinessStatus::Flaky => warnings.push(Alert {
                signature: record.signature.clone(),
                title: record.title.clone(),
                kind: AlertKind::FlakyWarning,
                severity: AlertSeverity::Warning,
                message: format!(
                    "Flaky in {} of {} runs ({}%)",
                    flakiness.status_changes, flakiness.total_runs, flakiness.percent
                ),
                regression: None,
            }),
            FlakinessStatus::NewFailure => errors.push(Alert {
                signature: record.signature.clone(),
                title: record.title.clone(),
                kind: AlertKind::NewFailure,
                severity: AlertSeverity::Error,
                message: format!(
                    "Started failing after {} stable runs",
                    flakiness.total_runs - 1
                ),
                regression: None,
            }),
            FlakinessStatus::Stable | FlakinessStatus::InsufficientData => {}
        }

        if let Some(report) = detect_regression(store, &record.signature, config) {
            if report.is_regression {
                #[allow(clippy::cast_possible_truncation)]
                let pct_increase = (100.0 * (report.current_duration_ms as f32 - report.mean_ms)
                    / report.mean_ms)
                    .round() as i64;
                errors.push(Alert {
                    signature: record.signature.clone(),
                    title: record.title.clone(),
                    kind: AlertKind::PerformanceRegression,
                    severity: AlertSeverity::Error,
                    message: format!(
                        "Duration increased {}% over historical mean ({}ms vs {:.0}ms)",
                        pct_increase, report.current_duration_ms, report.mean_ms
                    ),
                    regression: Some(report),
                });
            }
        }
    }

    // Stable partition: every error precedes every warning, scan order
    // preserved inside each class
    errors.append(&mut warnings);
    errors
}

//! Duration regression detection against a test's own history
//!
//! Flags the most recent execution as a regression when its duration is a
//! statistical outlier relative to the test's historical baseline: more
//! than `regression_sigma` standard deviations above the baseline mean.
//! The baseline excludes the run under test so a slow current run cannot
//! inflate its own threshold.

use crate::config::AnalyticsConfig;
use crate::statistics::duration_stats;
use crate::store::BoundedHistoryStore;
use serde::{Deserialize, Serialize};

/// Outcome of checking a test's latest duration against its baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub signature: String,
    pub is_regression: bool,
    /// Duration of the most recent run
    pub current_duration_ms: u64,
    /// Mean of all runs except the most recent
    pub mean_ms: f32,
    /// Population standard deviation of the baseline
    pub stddev_ms: f32,
    /// Regression trigger level: `mean + sigma * stddev`
    pub threshold_ms: f32,
}

/// Check whether a test's latest duration is an outlier
///
/// Returns `None` below `min_runs_regression` runs: too little history to
/// form a baseline. A zero-variance baseline never triggers: with a
/// perfectly uniform history any threshold equal to the mean would flag
/// every fluctuation, so the guard requires `stddev > 0`.
#[must_use]
pub fn detect_regression(
    store: &BoundedHistoryStore,
    signature: &str,
    config: &AnalyticsConfig,
) -> Option<RegressionReport> {
    let history = store.history(signature);
    if history.len() < config.min_runs_regression {
        return None;
    }

    let mut ordered: Vec<(i64, u64)> = history
        .iter()
        .map(|o| (o.started_at, o.duration_ms))
        .collect();
    ordered.sort_by_key(|(started_at, _)| *started_at);

    let (_, current_duration_ms) = *ordered.last()?;
    let baseline: Vec<f32> = ordered[..ordered.len() - 1]
        .iter()
        .map(|(_, d)| *d as f32)
        .collect();

    let stats = duration_stats(&baseline)?;
    let threshold_ms = stats.mean + config.regression_sigma * stats.stddev;

    let is_regression = current_duration_ms as f32 > threshold_ms && stats.stddev > 0.0;

    Some(RegressionReport {
        signature: signature.to_string(),
        is_regression,
        current_duration_ms,
        mean_ms: stats.mean,
        stddev_ms: stats.stddev,
        threshold_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutcomeInput, RunStats, RunSummary, TestStatus};
    use std::collections::HashMap;

    fn seeded_store(durations: &[u64]) -> BoundedHistoryStore {
        let mut store = BoundedHistoryStore::new(100);
        for (i, duration_ms) in durations.iter().enumerate() {
            let started_at = i as i64 * 1000;
            let run = RunSummary {
                run_id: format!("r{i}"),
                title: String::new(),
                environment: None,
                started_at,
                finished_at: started_at + 1,
                duration_ms: *duration_ms,
                stats: RunStats::default(),
            };
            let input = OutcomeInput {
                title: "index rebuild".to_string(),
                status: TestStatus::Passed,
                duration_ms: *duration_ms,
                started_at,
                stacktrace: None,
            };
            store.ingest(run, &HashMap::from([("t".to_string(), input)]));
        }
        store
    }

    fn detect(store: &BoundedHistoryStore) -> Option<RegressionReport> {
        detect_regression(store, "t", &AnalyticsConfig::default())
    }

    #[test]
    fn slow_outlier_is_flagged() {
        // Baseline mean 102.5, stddev ~= 8.29, threshold ~= 119.1
        let store = seeded_store(&[100, 110, 90, 110, 500]);
        let report = detect(&store).unwrap();

        assert!(report.is_regression);
        assert_eq!(report.current_duration_ms, 500);
        assert!((report.mean_ms - 102.5).abs() < 0.01);
        assert!(report.threshold_ms < 120.0);
    }

    #[test]
    fn zero_variance_baseline_never_triggers() {
        let store = seeded_store(&[100, 100, 100, 100, 500]);
        let report = detect(&store).unwrap();

        assert!(!report.is_regression);
        assert_eq!(report.stddev_ms, 0.0);
        assert_eq!(report.threshold_ms, 100.0);
    }

    #[test]
    fn within_threshold_is_not_a_regression() {
        let store = seeded_store(&[100, 110, 90, 110, 105]);
        let report = detect(&store).unwrap();
        assert!(!report.is_regression);
    }

    #[test]
    fn too_little_history_is_none() {
        let store = seeded_store(&[100, 110, 90, 110]);
        assert!(detect(&store).is_none());
    }

    #[test]
    fn unknown_signature_is_none() {
        let store = BoundedHistoryStore::new(100);
        assert!(detect_regression(&store, "never_seen", &AnalyticsConfig::default()).is_none());
    }

    #[test]
    fn baseline_excludes_current_run() {
        // If the 500ms run leaked into its own baseline the mean would be
        // 182 and the stddev large enough to mask the outlier.
        let store = seeded_store(&[100, 110, 90, 110, 500]);
        let report = detect(&store).unwrap();
        assert!((report.mean_ms - 102.5).abs() < 0.01);
    }

    #[test]
    fn most_recent_by_start_time_not_ingestion_order() {
        // The chronologically-last run is the slow one even though it was
        // ingested in the middle.
        let mut store = BoundedHistoryStore::new(100);
        let samples: [(i64, u64); 5] = [(0, 100), (1000, 100), (9000, 500), (2000, 110), (3000, 90)];
        for (i, (started_at, duration_ms)) in samples.iter().enumerate() {
            let run = RunSummary {
                run_id: format!("r{i}"),
                title: String::new(),
                environment: None,
                started_at: *started_at,
                finished_at: *started_at + 1,
                duration_ms: *duration_ms,
                stats: RunStats::default(),
            };
            let input = OutcomeInput {
                title: "t".to_string(),
                status: TestStatus::Passed,
                duration_ms: *duration_ms,
                started_at: *started_at,
                stacktrace: None,
            };
            store.ingest(run, &HashMap::from([("t".to_string(), input)]));
        }

        let report = detect(&store).unwrap();
        assert_eq!(report.current_duration_ms, 500);
        assert!(report.is_regression);
    }
}

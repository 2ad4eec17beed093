//! Configuration for the history analytics engine
//!
//! Every threshold the analyzers use lives here as a named field instead of
//! a magic number buried in an algorithm body, so hosts with different
//! capacity or sensitivity needs can tune the engine without forking it.

use serde::{Deserialize, Serialize};

/// Thresholds and capacity settings shared by the store and all analyzers
///
/// # Example
/// ```
/// use veleta::config::AnalyticsConfig;
///
/// let config = AnalyticsConfig::default();
/// assert_eq!(config.max_runs, 100); // live/in-memory capacity
/// assert_eq!(AnalyticsConfig::durable().max_runs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Capacity bound of the history store; oldest runs are evicted FIFO
    ///
    /// Reference values: 100 for live in-memory use (default), 30 when the
    /// host persists history durably between sessions.
    pub max_runs: usize,

    /// Minimum runs before flakiness classification produces a verdict
    ///
    /// Below this, [`classify_flakiness`](crate::flakiness::classify_flakiness)
    /// returns `insufficient_data` with a zero percent.
    pub min_runs_flakiness: usize,

    /// Minimum runs before a stability grade is assigned (otherwise `N/A`)
    pub min_runs_stability: usize,

    /// Minimum runs before duration regression detection runs at all
    pub min_runs_regression: usize,

    /// Flakiness percentage at or above which a test is classified flaky
    pub flaky_threshold_percent: u32,

    /// Share of failures that must carry the same error before the
    /// flakiness score is damped (consistent errors suggest one real
    /// defect rather than nondeterminism)
    pub error_consistency_ratio: f64,

    /// Error-message prefix length used for consistency grouping and
    /// failure cluster signatures
    pub error_prefix_len: usize,

    /// Sigma multiplier for the duration regression threshold
    /// (`mean + sigma * stddev`)
    pub regression_sigma: f32,

    /// Relative duration change (percent) considered significant when
    /// diffing two runs
    pub duration_change_percent: f64,

    /// Absolute duration change (milliseconds) considered significant when
    /// diffing two runs
    pub duration_change_ms: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_runs: 100,
            min_runs_flakiness: 5,
            min_runs_stability: 10,
            min_runs_regression: 5,
            flaky_threshold_percent: 20,
            error_consistency_ratio: 0.8,
            error_prefix_len: 100,
            regression_sigma: 2.0,
            duration_change_percent: 20.0,
            duration_change_ms: 500,
        }
    }
}

impl AnalyticsConfig {
    /// Configuration for hosts with durable persistence (smaller window)
    #[must_use]
    pub fn durable() -> Self {
        Self {
            max_runs: 30,
            ..Self::default()
        }
    }

    /// Stricter thresholds: fewer alerts, higher confidence in each one
    #[must_use]
    pub fn strict() -> Self {
        Self {
            flaky_threshold_percent: 30,
            regression_sigma: 3.0,
            duration_change_percent: 30.0,
            duration_change_ms: 1000,
            ..Self::default()
        }
    }

    /// Looser thresholds: surfaces potential problems earlier at the cost
    /// of more false positives
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            flaky_threshold_percent: 10,
            regression_sigma: 1.5,
            duration_change_percent: 10.0,
            duration_change_ms: 250,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_runs == 0 {
            return Err("max_runs must be at least 1".to_string());
        }

        if self.min_runs_flakiness < 2 {
            return Err(format!(
                "min_runs_flakiness must be >= 2 to observe a transition, got {}",
                self.min_runs_flakiness
            ));
        }

        if self.min_runs_regression < 2 {
            return Err(format!(
                "min_runs_regression must be >= 2 to form a baseline, got {}",
                self.min_runs_regression
            ));
        }

        if !(0.0..=1.0).contains(&self.error_consistency_ratio) {
            return Err(format!(
                "error_consistency_ratio must be in [0, 1], got {}",
                self.error_consistency_ratio
            ));
        }

        if self.error_prefix_len == 0 {
            return Err("error_prefix_len must be at least 1".to_string());
        }

        if self.regression_sigma <= 0.0 {
            return Err(format!(
                "regression_sigma must be positive, got {}",
                self.regression_sigma
            ));
        }

        if self.duration_change_percent < 0.0 {
            return Err(format!(
                "duration_change_percent must be non-negative, got {}",
                self.duration_change_percent
            ));
        }

        Ok(())
    }
}

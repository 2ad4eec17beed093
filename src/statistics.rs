//! Duration statistics using trueno's SIMD-optimized vector primitives
//!
//! Thin wrappers over `trueno::Vector` specialized for millisecond duration
//! samples. trueno computes population statistics (divide by n), which is
//! what the analyzers expect: a history is the whole population of observed
//! runs, not a sample from a larger one.

use trueno::Vector;

/// Mean and population standard deviation of a duration sample set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    pub mean: f32,
    pub stddev: f32,
}

/// Compute mean and population standard deviation over duration samples
///
/// Returns `None` for an empty sample set. A single sample yields a
/// stddev of 0.
#[must_use]
pub fn duration_stats(samples: &[f32]) -> Option<DurationStats> {
    if samples.is_empty() {
        return None;
    }

    let v = Vector::from_slice(samples);
    let mean = v.mean().unwrap_or(0.0);
    let stddev = v.stddev().unwrap_or(0.0);

    Some(DurationStats { mean, stddev })
}

/// Coefficient of variation as a percentage, capped at 100
///
/// CV = stddev / mean, a normalized measure of duration variability.
/// Defined as 0 when the mean is 0 so that all-zero histories never
/// produce NaN.
#[must_use]
pub fn duration_cv_percent(samples: &[f32]) -> f32 {
    let Some(stats) = duration_stats(samples) else {
        return 0.0;
    };

    if stats.mean.abs() < f32::EPSILON {
        return 0.0;
    }

    (100.0 * stats.stddev / stats.mean).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_uniform_samples() {
        let stats = duration_stats(&[100.0, 100.0, 100.0, 100.0]).unwrap();
        assert_eq!(stats.mean, 100.0);
        assert_eq!(stats.stddev, 0.0);
    }

    #[test]
    fn stats_population_stddev() {
        // mean = 5, population variance = ((2-5)^2 + (4-5)^2 + (6-5)^2 + (8-5)^2) / 4 = 5
        let stats = duration_stats(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((stats.mean - 5.0).abs() < 0.01);
        assert!((stats.stddev - 5.0_f32.sqrt()).abs() < 0.01);
    }

    #[test]
    fn stats_empty_is_none() {
        assert!(duration_stats(&[]).is_none());
    }

    #[test]
    fn cv_zero_mean_is_zero() {
        assert_eq!(duration_cv_percent(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn cv_uniform_is_zero() {
        assert_eq!(duration_cv_percent(&[50.0, 50.0, 50.0]), 0.0);
    }

    #[test]
    fn cv_capped_at_100() {
        // Extreme spread: stddev well above the mean
        let cv = duration_cv_percent(&[1.0, 1.0, 1.0, 10_000.0]);
        assert_eq!(cv, 100.0);
    }

    #[test]
    fn cv_moderate_spread() {
        // mean = 100, population stddev ~= 8.16 -> CV ~= 8.16%
        let cv = duration_cv_percent(&[90.0, 100.0, 110.0, 90.0, 100.0, 110.0]);
        assert!((cv - 8.16).abs() < 0.1);
    }
}

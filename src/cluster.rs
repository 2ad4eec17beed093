//! Failure clustering by normalized error signature
//!
//! Groups the currently-failing tests of a live run by the leading portion
//! of their error text. Two or more failures sharing a signature usually
//! share a root cause, so surfacing the clusters is faster to triage than
//! reading failures one by one. Operates on the live result set, not the
//! history store.

use crate::config::AnalyticsConfig;
use crate::model::{first_line, NO_ERROR_SENTINEL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Smallest group worth reporting; singletons are noise
const MIN_CLUSTER_SIZE: usize = 2;

/// One currently-failing test as supplied by the live run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTest {
    pub signature: String,
    pub title: String,
    /// Assertion/error message, preferred over the stack trace
    pub message: Option<String>,
    pub stacktrace: Option<String>,
}

/// A group of failures sharing one normalized error signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureCluster {
    /// Normalized error text the members share
    pub error_pattern: String,
    pub tests: Vec<FailedTest>,
}

/// Group currently-failing tests by normalized error signature
///
/// Returns clusters of at least [`MIN_CLUSTER_SIZE`] members, largest
/// first. Ties keep first-seen order, so output is deterministic for a
/// given input order.
#[must_use]
pub fn cluster_failures(failed: &[FailedTest], config: &AnalyticsConfig) -> Vec<FailureCluster> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<FailedTest>> = HashMap::new();

    for test in failed {
        let key = error_signature(test, config.error_prefix_len);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(test.clone());
    }

    let mut clusters: Vec<FailureCluster> = order
        .into_iter()
        .filter_map(|pattern| {
            let tests = groups.remove(&pattern)?;
            (tests.len() >= MIN_CLUSTER_SIZE).then_some(FailureCluster {
                error_pattern: pattern,
                tests,
            })
        })
        .collect();

    clusters.sort_by(|a, b| b.tests.len().cmp(&a.tests.len()));
    clusters
}

/// Normalized grouping key for one failure
///
/// Error source preference: the message, else the first line of the stack
/// trace, else the no-error sentinel. Normalization: first
/// `prefix_len` characters, lowercased, trimmed, internal whitespace runs
/// collapsed to single spaces.
fn error_signature(test: &FailedTest, prefix_len: usize) -> String {
    let source = test
        .message
        .clone()
        .or_else(|| test.stacktrace.as_deref().and_then(first_line));

    let Some(text) = source else {
        return NO_ERROR_SENTINEL.to_string();
    };

    let prefix: String = text.chars().take(prefix_len).collect();
    collapse_whitespace(prefix.to_lowercase().trim())
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_gap = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_gap {
                out.push(' ');
            }
            in_gap = true;
        } else {
            out.push(c);
            in_gap = false;
        }
    }
    out
}

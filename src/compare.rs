//! Test-by-test diff between two historical runs
//!
//! Scans every test history for outcomes belonging to the two runs, then
//! classifies each signature as added, removed, status-changed,
//! duration-changed, or unchanged. Output order follows signature order,
//! so the diff is deterministic.

use crate::config::AnalyticsConfig;
use crate::model::TestStatus;
use crate::store::BoundedHistoryStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of a status flip between the two runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusChangeKind {
    /// passed in base, failed in compare
    Regression,
    /// failed in base, passed in compare
    Fixed,
    /// any other pair (skips, broken, ...)
    Other,
}

/// One test's state within a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSnapshot {
    pub signature: String,
    pub title: String,
    pub status: TestStatus,
    pub duration_ms: u64,
}

/// A signature whose status differs between the two runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub signature: String,
    pub title: String,
    pub base_status: TestStatus,
    pub compare_status: TestStatus,
    pub kind: StatusChangeKind,
}

/// A signature whose duration moved significantly between the two runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationChange {
    pub signature: String,
    pub title: String,
    pub base_duration_ms: u64,
    pub compare_duration_ms: u64,
    /// compare minus base; negative when the test got faster
    pub difference_ms: i64,
    /// Relative change against the base duration; 0 when base is 0
    pub percent_change: f64,
    pub is_significant: bool,
}

/// Aggregate counts over the diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub base_total: usize,
    pub compare_total: usize,
    pub added: usize,
    pub removed: usize,
    pub status_changed: usize,
    pub duration_changed: usize,
    /// Present in both runs with neither a status change nor a significant
    /// duration change
    pub unchanged: usize,
    pub regressions: usize,
    pub fixed: usize,
}

/// Full diff between a base run and a compare run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub base_run_id: String,
    pub compare_run_id: String,
    /// Signatures only present in the compare run
    pub added: Vec<TestSnapshot>,
    /// Signatures only present in the base run
    pub removed: Vec<TestSnapshot>,
    pub status_changes: Vec<StatusChange>,
    pub duration_changes: Vec<DurationChange>,
    pub summary: ComparisonSummary,
}

/// Diff two historical runs test-by-test
///
/// A run id absent from the store contributes an empty side: all of the
/// other run's tests then show up as added or removed.
#[must_use]
pub fn compare_runs(
    store: &BoundedHistoryStore,
    base_run_id: &str,
    compare_run_id: &str,
    config: &AnalyticsConfig,
) -> ComparisonResult {
    let base = snapshot_map(store, base_run_id);
    let compare = snapshot_map(store, compare_run_id);

    let mut result = ComparisonResult {
        base_run_id: base_run_id.to_string(),
        compare_run_id: compare_run_id.to_string(),
        added: Vec::new(),
        removed: Vec::new(),
        status_changes: Vec::new(),
        duration_changes: Vec::new(),
        summary: ComparisonSummary {
            base_total: base.len(),
            compare_total: compare.len(),
            ..ComparisonSummary::default()
        },
    };

    for (signature, snapshot) in &compare {
        if !base.contains_key(signature) {
            result.added.push(snapshot.clone());
        }
    }

    for (signature, base_snap) in &base {
        let Some(compare_snap) = compare.get(signature) else {
            result.removed.push(base_snap.clone());
            continue;
        };

        let mut touched = false;

        if base_snap.status != compare_snap.status {
            result.status_changes.push(StatusChange {
                signature: signature.clone(),
                title: base_snap.title.clone(),
                base_status: base_snap.status,
                compare_status: compare_snap.status,
                kind: change_kind(base_snap.status, compare_snap.status),
            });
            touched = true;
        }

        if let Some(change) = duration_change(base_snap, compare_snap, config) {
            result.duration_changes.push(change);
            touched = true;
        }

        if !touched {
            result.summary.unchanged += 1;
        }
    }

    result.summary.added = result.added.len();
    result.summary.removed = result.removed.len();
    result.summary.status_changed = result.status_changes.len();
    result.summary.duration_changed = result.duration_changes.len();
    result.summary.regressions = result
        .status_changes
        .iter()
        .filter(|c| c.kind == StatusChangeKind::Regression)
        .count();
    result.summary.fixed = result
        .status_changes
        .iter()
        .filter(|c| c.kind == StatusChangeKind::Fixed)
        .count();

    result
}

/// Collect `signature -> snapshot` for one run by scanning every history
fn snapshot_map(store: &BoundedHistoryStore, run_id: &str) -> BTreeMap<String, TestSnapshot> {
    let mut map = BTreeMap::new();
    for record in store.records() {
        if let Some(outcome) = record.outcomes.iter().find(|o| o.run_id == run_id) {
            map.insert(
                record.signature.clone(),
                TestSnapshot {
                    signature: record.signature.clone(),
                    title: record.title.clone(),
                    status: outcome.status,
                    duration_ms: outcome.duration_ms,
                },
            );
        }
    }
    map
}

const fn change_kind(base: TestStatus, compare: TestStatus) -> StatusChangeKind {
    match (base, compare) {
        (TestStatus::Passed, TestStatus::Failed) => StatusChangeKind::Regression,
        (TestStatus::Failed, TestStatus::Passed) => StatusChangeKind::Fixed,
        _ => StatusChangeKind::Other,
    }
}

/// Significant duration delta between two snapshots, if any
fn duration_change(
    base: &TestSnapshot,
    compare: &TestSnapshot,
    config: &AnalyticsConfig,
) -> Option<DurationChange> {
    let difference_ms = compare.duration_ms as i64 - base.duration_ms as i64;
    let percent_change = if base.duration_ms == 0 {
        0.0
    } else {
        100.0 * difference_ms as f64 / base.duration_ms as f64
    };

    let is_significant = percent_change.abs() > config.duration_change_percent
        || difference_ms.unsigned_abs() > config.duration_change_ms;

    is_significant.then_some(DurationChange {
        signature: base.signature.clone(),
        title: base.title.clone(),
        base_duration_ms: base.duration_ms,
        compare_duration_ms: compare.duration_ms,
        difference_ms,
        percent_change,
        is_significant,
    })
}

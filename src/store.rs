//! Bounded run-history store
//!
//! Source of truth for every analyzer in this crate. Holds two nested
//! collections that must stay mutually consistent: the FIFO-ordered run
//! list and the per-test outcome histories. The capacity bound is enforced
//! on ingestion; eviction removes the oldest run by insertion order (not by
//! timestamp) and scrubs its outcomes from every test record, dropping
//! records that end up empty.
//!
//! The store is single-writer by design: all operations are synchronous
//! and the host serializes concurrent ingestion if it is multi-threaded.

use crate::config::AnalyticsConfig;
use crate::model::{first_line, OutcomeInput, RunSummary, TestHistoryRecord, TestOutcome};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Bounded, cross-referentially consistent run/test history
///
/// Invariants upheld after every mutation:
/// - every `run_id` referenced by an outcome exists in the run list
/// - the run list never exceeds `max_runs`
/// - no test record has an empty outcome list
/// - run ids and signatures are unique
///
/// Test records are keyed in a `BTreeMap` so iteration order (and thus the
/// alert scan order and comparison output) is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundedHistoryStore {
    max_runs: usize,
    runs: VecDeque<RunSummary>,
    #[serde(skip)]
    run_ids: HashSet<String>,
    records: BTreeMap<String, TestHistoryRecord>,
    version: u64,
}

impl BoundedHistoryStore {
    /// Create an empty store holding at most `max_runs` runs
    #[must_use]
    pub fn new(max_runs: usize) -> Self {
        Self {
            max_runs,
            runs: VecDeque::new(),
            run_ids: HashSet::new(),
            records: BTreeMap::new(),
            version: 0,
        }
    }

    /// Create an empty store sized from an [`AnalyticsConfig`]
    #[must_use]
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.max_runs)
    }

    /// Ingest one run and its per-test outcomes
    ///
    /// Idempotent: a `run_id` already present leaves the store untouched.
    /// Never fails on well-formed input; shape validation is the loader's
    /// job. Evicts the oldest runs (FIFO by insertion order) once the
    /// capacity bound is exceeded.
    pub fn ingest(&mut self, run: RunSummary, outcomes: &HashMap<String, OutcomeInput>) {
        if self.run_ids.contains(&run.run_id) {
            tracing::debug!(run_id = %run.run_id, "duplicate run ignored");
            return;
        }

        let run_id = run.run_id.clone();
        tracing::debug!(run_id = %run_id, tests = outcomes.len(), "ingesting run");

        self.run_ids.insert(run_id.clone());
        self.runs.push_back(run);

        for (signature, input) in outcomes {
            let record = self
                .records
                .entry(signature.clone())
                .or_insert_with(|| TestHistoryRecord {
                    signature: signature.clone(),
                    // Title is pinned at first sighting of the signature
                    title: input.title.clone(),
                    outcomes: Vec::new(),
                });

            record.outcomes.push(TestOutcome {
                run_id: run_id.clone(),
                status: input.status,
                duration_ms: input.duration_ms,
                started_at: input.started_at,
                error_message: input.stacktrace.as_deref().and_then(first_line),
            });
        }

        while self.runs.len() > self.max_runs {
            self.evict_oldest();
        }

        self.version += 1;
    }

    /// Evict the run at the front of the FIFO and scrub its outcomes
    fn evict_oldest(&mut self) {
        let Some(evicted) = self.runs.pop_front() else {
            return;
        };

        self.run_ids.remove(&evicted.run_id);

        for record in self.records.values_mut() {
            record.outcomes.retain(|o| o.run_id != evicted.run_id);
        }

        // Orphan cleanup: a record with no outcomes left is gone
        self.records.retain(|_, record| !record.outcomes.is_empty());

        tracing::debug!(run_id = %evicted.run_id, "evicted oldest run");
    }

    /// Outcome history for a signature, oldest ingested first
    ///
    /// Returns an empty slice for unknown signatures.
    #[must_use]
    pub fn history(&self, signature: &str) -> &[TestOutcome] {
        self.records
            .get(signature)
            .map_or(&[], |record| record.outcomes.as_slice())
    }

    /// Full record for a signature, if the test has ever been seen
    #[must_use]
    pub fn record(&self, signature: &str) -> Option<&TestHistoryRecord> {
        self.records.get(signature)
    }

    /// All test records, ordered by signature
    pub fn records(&self) -> impl Iterator<Item = &TestHistoryRecord> {
        self.records.values()
    }

    /// All known signatures, ordered
    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Runs in insertion (FIFO) order, oldest first
    pub fn runs(&self) -> impl Iterator<Item = &RunSummary> {
        self.runs.iter()
    }

    /// Look up a run by id
    #[must_use]
    pub fn run(&self, run_id: &str) -> Option<&RunSummary> {
        self.runs.iter().find(|r| r.run_id == run_id)
    }

    /// Number of runs currently held
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Number of distinct test signatures currently held
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.records.len()
    }

    /// Capacity bound this store was created with
    #[must_use]
    pub fn max_runs(&self) -> usize {
        self.max_runs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Monotonic counter bumped by every mutation
    ///
    /// Analysis results are pure functions of the store contents; hosts
    /// that memoize them can key caches on this counter and invalidate
    /// when it moves.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Drop all runs and histories; the only bulk deletion path
    pub fn clear(&mut self) {
        self.runs.clear();
        self.run_ids.clear();
        self.records.clear();
        self.version += 1;
    }

    /// Rebuild the transient run-id index after deserialization
    ///
    /// `run_ids` is a derived index and is skipped by serde; hosts that
    /// restore a persisted store call this before the first `ingest`.
    pub fn rebuild_index(&mut self) {
        self.run_ids = self.runs.iter().map(|r| r.run_id.clone()).collect();
    }
}

//! Property-based tests for the bounded history store invariants
//!
//! The store must keep its two nested collections consistent under any
//! ingestion sequence: capacity bound, referential integrity between
//! outcomes and runs, no orphaned test records, idempotent run ids.

use proptest::prelude::*;
use std::collections::HashMap;
use veleta::model::{OutcomeInput, RunStats, RunSummary, TestStatus};
use veleta::store::BoundedHistoryStore;

fn status_from(index: u8) -> TestStatus {
    match index % 4 {
        0 => TestStatus::Passed,
        1 => TestStatus::Failed,
        2 => TestStatus::Skipped,
        _ => TestStatus::Broken,
    }
}

/// One synthetic run: id index, and per-test (signature index, status seed)
fn ingest_synthetic(store: &mut BoundedHistoryStore, run_index: u8, tests: &[(u8, u8)]) {
    let started_at = i64::from(run_index) * 1000;
    let run = RunSummary {
        run_id: format!("run-{run_index}"),
        title: format!("run {run_index}"),
        environment: None,
        started_at,
        finished_at: started_at + 10,
        duration_ms: 10,
        stats: RunStats::default(),
    };
    let outcomes: HashMap<String, OutcomeInput> = tests
        .iter()
        .map(|(sig_index, status_seed)| {
            (
                format!("test-{sig_index}"),
                OutcomeInput {
                    title: format!("test {sig_index}"),
                    status: status_from(*status_seed),
                    duration_ms: u64::from(*status_seed) * 10 + 1,
                    started_at,
                    stacktrace: None,
                },
            )
        })
        .collect();
    store.ingest(run, &outcomes);
}

/// Check every cross-referential invariant the store promises
fn assert_invariants(store: &BoundedHistoryStore, max_runs: usize) {
    // Capacity bound
    assert!(store.run_count() <= max_runs);

    // Unique run ids
    let ids: Vec<&str> = store.runs().map(|r| r.run_id.as_str()).collect();
    let mut deduped = ids.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());

    for record in store.records() {
        // No orphaned records
        assert!(!record.outcomes.is_empty());

        // Every outcome's run still exists
        for outcome in &record.outcomes {
            assert!(
                store.run(&outcome.run_id).is_some(),
                "outcome references evicted run {}",
                outcome.run_id
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_invariants_hold_for_any_ingest_sequence(
        max_runs in 1usize..8,
        runs in prop::collection::vec(
            (0u8..60, prop::collection::vec((0u8..10, 0u8..=255), 0..6)),
            0..40,
        ),
    ) {
        let mut store = BoundedHistoryStore::new(max_runs);

        for (run_index, tests) in &runs {
            ingest_synthetic(&mut store, *run_index, tests);
            assert_invariants(&store, max_runs);
        }
    }

    #[test]
    fn prop_duplicate_run_ids_never_change_the_store(
        tests in prop::collection::vec((0u8..10, 0u8..=255), 1..6),
        repeats in 1usize..5,
    ) {
        let mut store = BoundedHistoryStore::new(10);
        ingest_synthetic(&mut store, 7, &tests);

        let runs_before = store.run_count();
        let outcomes_before: Vec<usize> =
            store.records().map(|r| r.outcomes.len()).collect();
        let version_before = store.version();

        for _ in 0..repeats {
            ingest_synthetic(&mut store, 7, &tests);
        }

        assert_eq!(store.run_count(), runs_before);
        let outcomes_after: Vec<usize> =
            store.records().map(|r| r.outcomes.len()).collect();
        assert_eq!(outcomes_after, outcomes_before);
        assert_eq!(store.version(), version_before);
    }

    #[test]
    fn prop_overflow_evicts_exactly_the_oldest(
        max_runs in 1usize..6,
        extra in 1u8..20,
    ) {
        let mut store = BoundedHistoryStore::new(max_runs);
        let total = max_runs as u8 + extra;

        for i in 0..total {
            ingest_synthetic(&mut store, i, &[(0, 0)]);
        }

        assert_eq!(store.run_count(), max_runs);
        let ids: Vec<String> = store.runs().map(|r| r.run_id.clone()).collect();
        let expected: Vec<String> = (total - max_runs as u8..total)
            .map(|i| format!("run-{i}"))
            .collect();
        assert_eq!(ids, expected);

        // The surviving outcome list mirrors the surviving runs
        assert_eq!(store.history("test-0").len(), max_runs);
    }
}

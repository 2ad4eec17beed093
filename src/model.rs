//! Core data model for run history analytics
//!
//! Plain data shapes exchanged with the external collaborators: the run
//! loader feeds `RunSummary` + `OutcomeInput` records into the store, the
//! persistence and presentation layers consume the stored shapes as-is.
//! The engine assumes well-formed records; raw input validation happens
//! upstream in the loader.

use serde::{Deserialize, Serialize};

/// Grouping key used when a failure carries no error text at all
pub const NO_ERROR_SENTINEL: &str = "__no_error__";

/// Outcome status of a single test execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Broken,
}

impl TestStatus {
    /// Whether this status carries pass/fail signal.
    ///
    /// Skipped and broken executions are ignored by the transition walk in
    /// flakiness analysis: they neither count as a status change nor update
    /// the previous-status cursor.
    #[must_use]
    pub const fn is_conclusive(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }

    /// Lowercase label matching the serialized form
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Broken => "broken",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-run aggregate counters, copied verbatim from the loader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub blocked: u32,
    pub invalid: u32,
    pub muted: u32,
}

/// One ingested run. Immutable after creation; identity is `run_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Stable run identity; re-ingesting an existing id is a no-op
    pub run_id: String,
    pub title: String,
    pub environment: Option<String>,
    /// Epoch milliseconds
    pub started_at: i64,
    /// Epoch milliseconds
    pub finished_at: i64,
    pub duration_ms: u64,
    pub stats: RunStats,
}

/// One execution record inside a [`TestHistoryRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Back-reference to the owning run
    pub run_id: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    /// Epoch milliseconds
    pub started_at: i64,
    /// Trimmed first line of the stack trace, when one was captured
    pub error_message: Option<String>,
}

/// Raw per-test result handed over by the run loader for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeInput {
    /// Human-readable test title; recorded on first sighting of a signature
    pub title: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub started_at: i64,
    /// Full stack trace as captured; the store keeps only the first line
    pub stacktrace: Option<String>,
}

/// Full cross-run history of one logical test case
///
/// Keyed by `signature`, the stable cross-run test identity (not the
/// per-run execution UUID). Created lazily on first sighting; dropped by
/// the store once eviction empties its outcome list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestHistoryRecord {
    pub signature: String,
    pub title: String,
    pub outcomes: Vec<TestOutcome>,
}

/// Trimmed first line of a block of text, or `None` if there is none.
///
/// Used to reduce multi-line stack traces to a single comparable error
/// message at ingestion time.
#[must_use]
pub fn first_line(text: &str) -> Option<String> {
    let line = text.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

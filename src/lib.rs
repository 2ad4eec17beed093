//! Veleta - test run history analytics
//!
//! This library analyzes a bounded time series of test-run executions to
//! surface signal a single run cannot reveal: which tests are flaky, how
//! stable each test is over time, which tests regressed in duration, which
//! current failures share a root cause, and what changed between two runs.
//!
//! The [`store::BoundedHistoryStore`] is the single source of truth; every
//! analyzer is a stateless function over its contents. Loading raw run
//! files, persisting the store, and rendering results are left to the host.

pub mod alerts;
pub mod cluster;
pub mod compare;
pub mod config;
pub mod flakiness;
pub mod model;
pub mod regression;
pub mod stability;
pub mod statistics;
pub mod store;

// src/crawl/mod.rs
// =============================================================================
// This module drives the crawl.
//
// - dispatch.rs: lanes, scope, the static-asset blacklist and the redirect gate
// - state.rs:    visited keys, seen lengths and counters shared by all tasks
// - runner.rs:   the coordinator that fetches, mines and re-dispatches
//
// Rust concepts:
// - Async programming: one tokio task per fetched URL
// - Shared state: Arc + a parking_lot mutex for the visited sets
// =============================================================================

mod dispatch;
mod runner;
mod state;

pub use dispatch::redirect_gate;
pub use runner::{Coordinator, CrawlOutcome, CrawlSummary};
pub use state::CrawlState;

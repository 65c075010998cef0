// src/output.rs
// =============================================================================
// Logging setup and the records the crawler emits.
//
// Every completed, non-suppressed response becomes one info-level line:
//
//   INFO https://example.com/login code=200 length=5120 error=3 title="Sign in"
//
// or, with --json, one JSON object per line. The crawl ends with a summary
// line (visited, error, emitted, outcome).
//
// RUST_LOG, when set, replaces the default filter entirely.
// =============================================================================

use crate::crawl::{CrawlOutcome, CrawlSummary};
use anyhow::{anyhow, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// One line of crawl output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub url: String,
    pub code: u16,
    pub length: usize,
    /// Cumulative error count at the time of the response
    pub errors: u64,
    pub title: Option<String>,
}

pub fn init_logging(json: bool, debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stdout);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

// Our crate at the requested level; the browser driver is chatty at debug
fn default_directives(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    format!("endpoint_scout={level},chromiumoxide=warn")
}

pub fn log_response(record: &ResponseRecord) {
    match &record.title {
        Some(title) => info!(
            code = record.code,
            length = record.length,
            error = record.errors,
            title = %title,
            "{}",
            record.url
        ),
        None => info!(
            code = record.code,
            length = record.length,
            error = record.errors,
            "{}",
            record.url
        ),
    }
}

pub fn log_summary(summary: &CrawlSummary) {
    if summary.outcome == CrawlOutcome::TimedOut {
        error!("crawl timed out, counts below are a snapshot");
    }
    info!(
        visited = summary.visited,
        error = summary.errors,
        emitted = summary.emitted,
        outcome = %summary.outcome,
        "crawl finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "endpoint_scout=info,chromiumoxide=warn");
        assert_eq!(default_directives(true), "endpoint_scout=debug,chromiumoxide=warn");
        assert!(EnvFilter::try_new(default_directives(true)).is_ok());
    }
}

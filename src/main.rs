// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Validate them into a CrawlConfig
// 3. Build the fetch engine (and the headless browser unless --no-browser)
// 4. Run the crawl and log its summary
// 5. Exit with proper code (0 = completed, 1 = total timeout, 2 = error)
//
// Rust concepts used:
// - async/await: both fetch lanes run concurrently on tokio
// - Result<T, E>: configuration problems are typed, the rest goes through anyhow
// - Arc: the visited set is shared between the crawler and the redirect gate
// =============================================================================

// Module declarations - tells Rust about our other source files
mod browser; // src/browser/ - headless Chrome for rendering and chunk names
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - validated crawl settings
mod crawl; // src/crawl/ - the two-lane coordinator
mod fetch; // src/fetch/ - the HTTP engine
mod filter; // src/filter.rs - response suppression rules
mod finder; // src/finder/ - link extractors
mod output; // src/output.rs - logging and response records
mod util; // src/util/ - URL and text helpers
mod wordlist; // src/wordlist.rs - extra seed paths

use anyhow::Result;
use browser::ChromeEngine;
use clap::Parser;
use cli::Cli;
use config::CrawlConfig;
use crawl::{Coordinator, CrawlOutcome, CrawlState};
use fetch::HttpFetcher;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = crawl completed
//   Ok(1) = total timeout reached
//   Ok(2) = invalid invocation or the browser could not start
//   Err = unexpected error
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    output::init_logging(cli.json, cli.debug)?;

    let config = match CrawlConfig::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(2);
        }
    };

    if !config.filters.is_empty() {
        info!(filters = ?config.filters.describe(), "response filters active");
    }

    let state = Arc::new(CrawlState::new());

    // Redirect hops obey the same scope and visited rules as discovered links
    let gate = (!config.no_redirect).then(|| crawl::redirect_gate(&config, Arc::clone(&state)));
    let fetcher = Arc::new(HttpFetcher::new(&config.fetch_options(), gate)?);

    let engine = if config.use_browser {
        match ChromeEngine::launch(&config.chrome_options()).await {
            Ok(engine) => Some(Arc::new(engine)),
            Err(e) => {
                error!("cannot start the browser (use --no-browser to crawl without it): {e}");
                return Ok(2);
            }
        }
    } else {
        None
    };

    let summary = Coordinator::new(config, fetcher, engine, state)
        .execute()
        .await;
    output::log_summary(&summary);

    Ok(match summary.outcome {
        CrawlOutcome::Completed => 0,
        CrawlOutcome::TimedOut => 1,
    })
}

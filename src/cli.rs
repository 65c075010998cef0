// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the struct below *is* the CLI. clap generates
// parsing, --help and --version from the field types and attributes.
//
// Values are only parsed here, not validated; config.rs turns a Cli into a
// checked CrawlConfig (absolute target, readable wordlist, valid filters...).
//
// Rust concepts:
// - Derive macros: #[derive(Parser)] generates the parser
// - Option<T>: flags that may be absent
// - Vec<T>: flags that may be repeated (-H a -H b)
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "endpoint-scout",
    version,
    about = "Discover the HTTP endpoints of a web application",
    long_about = "endpoint-scout crawls a target site and reports every endpoint it can reach: \
                  pages, scripts, form targets, sitemap and robots.txt entries, links mined from \
                  JavaScript bundles and API calls synthesised from Swagger documents."
)]
pub struct Cli {
    /// Target URL (e.g., https://app.example.com/)
    pub target: String,

    /// Maximum link depth from the seed URLs (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub depth: usize,

    /// Per-request timeout in seconds (HTTP and browser)
    #[arg(short = 't', long, default_value_t = 10)]
    pub timeout: u64,

    /// Stop waiting for the crawl after this many seconds (0 = no limit)
    #[arg(long, default_value_t = 0)]
    pub total_timeout: u64,

    /// Extra request header, e.g. -H 'Cookie: session=abc' (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// File with one path per line, joined onto the target as extra seeds
    #[arg(short = 'w', long)]
    pub wordlist: Option<PathBuf>,

    /// Maximum number of in-flight requests per lane
    #[arg(short = 'l', long, default_value_t = 100)]
    pub limit: usize,

    /// Send a random browser User-Agent with every request
    #[arg(long)]
    pub random_agent: bool,

    /// Proxy URL for HTTP requests and the browser
    #[arg(long)]
    pub proxy: Option<String>,

    /// Also crawl subdomains of the target's parent domain
    #[arg(long)]
    pub subdomains: bool,

    /// Never follow redirects (they are logged instead)
    #[arg(long)]
    pub no_redirect: bool,

    /// Render HTML pages in headless Chrome before extracting links
    #[arg(long)]
    pub chrome: bool,

    /// Never start a browser (disables chunk resolution and --chrome)
    #[arg(long)]
    pub no_browser: bool,

    /// Strip query strings from discovered page links
    #[arg(long)]
    pub ignore_query: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Debug logging
    #[arg(long)]
    pub debug: bool,

    /// Suppress responses with these status codes (e.g. 403,500)
    #[arg(long, value_name = "CODES")]
    pub filter_status: Option<String>,

    /// Suppress responses with these extensions (e.g. css,png)
    #[arg(long, value_name = "EXTS")]
    pub filter_ext: Option<String>,

    /// Suppress responses with these body lengths in bytes
    #[arg(long, value_name = "LENGTHS")]
    pub filter_length: Option<String>,

    /// Suppressed responses are also not searched for links
    #[arg(long)]
    pub filter_halts_discovery: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["endpoint-scout", "http://example.com/"]);
        assert_eq!(cli.target, "http://example.com/");
        assert_eq!(cli.depth, 0);
        assert_eq!(cli.timeout, 10);
        assert_eq!(cli.total_timeout, 0);
        assert_eq!(cli.limit, 100);
        assert!(cli.headers.is_empty());
        assert!(!cli.no_browser);
    }

    #[test]
    fn test_repeated_headers_and_filters() {
        let cli = Cli::parse_from([
            "endpoint-scout",
            "-H",
            "Cookie: a=1",
            "--header",
            "X-Api-Key: k",
            "--filter-status",
            "403,500",
            "-t",
            "3",
            "http://example.com/",
        ]);
        assert_eq!(cli.headers, vec!["Cookie: a=1", "X-Api-Key: k"]);
        assert_eq!(cli.filter_status.as_deref(), Some("403,500"));
        assert_eq!(cli.timeout, 3);
    }

    #[test]
    fn test_target_is_required() {
        assert!(Cli::try_parse_from(["endpoint-scout"]).is_err());
    }
}

// src/config.rs
// =============================================================================
// Turns parsed command-line arguments into a validated CrawlConfig.
//
// Everything that can be wrong with the invocation is detected here, before
// any request is sent: a bad target or proxy URL, an unreadable wordlist, a
// malformed filter list or header. The rest of the program can then treat
// the configuration as trusted and immutable.
// =============================================================================

use crate::browser::ChromeOptions;
use crate::cli::Cli;
use crate::fetch::FetchOptions;
use crate::filter::{filter_by_name, FilterChain, FilterError};
use crate::util::is_absolute;
use crate::wordlist::Wordlist;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid target URL '{0}': expected an absolute http(s) URL")]
    InvalidTarget(String),

    #[error("invalid proxy URL '{0}'")]
    InvalidProxy(String),

    #[error("cannot read wordlist {path}: {source}")]
    Wordlist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("invalid header '{0}': expected 'Name: value'")]
    InvalidHeader(String),

    #[error("--limit must be at least 1")]
    ZeroLimit,

    #[error("--chrome needs the browser, but --no-browser was given")]
    ChromeWithoutBrowser,
}

// Whether filter suppression also stops link extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterScope {
    /// Suppressed responses are not logged, but their links are followed
    #[default]
    Output,
    /// Suppressed responses are neither logged nor searched for links
    Discovery,
}

#[derive(Debug)]
pub struct CrawlConfig {
    pub target: Url,
    /// scheme://host[:port]/ of the target
    pub target_root: Url,
    /// None = unlimited
    pub max_depth: Option<usize>,
    pub request_timeout: Duration,
    /// None = wait for the crawl to finish however long it takes
    pub total_timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
    pub wordlist: Option<Wordlist>,
    /// In-flight requests per lane
    pub parallel: usize,
    pub random_agent: bool,
    pub proxy: Option<Url>,
    pub subdomains: bool,
    pub no_redirect: bool,
    pub render_pages: bool,
    pub use_browser: bool,
    pub ignore_query: bool,
    pub filters: FilterChain,
    pub filter_scope: FilterScope,
}

impl CrawlConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let target = parse_target(&cli.target)?;
        let target_root = target
            .join("/")
            .map_err(|_| ConfigError::InvalidTarget(cli.target.clone()))?;

        let proxy = cli
            .proxy
            .as_deref()
            .map(|raw| {
                let invalid = || ConfigError::InvalidProxy(raw.to_string());
                if !is_absolute(raw) {
                    return Err(invalid());
                }
                Url::parse(raw).map_err(|_| invalid())
            })
            .transpose()?;

        let headers = cli
            .headers
            .iter()
            .map(|raw| parse_header(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let wordlist = cli
            .wordlist
            .map(|path| {
                Wordlist::from_file(&path).map_err(|source| ConfigError::Wordlist { path, source })
            })
            .transpose()?;

        if cli.limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if cli.chrome && cli.no_browser {
            return Err(ConfigError::ChromeWithoutBrowser);
        }

        let filters = [
            ("status", &cli.filter_status),
            ("extension", &cli.filter_ext),
            ("length", &cli.filter_length),
        ]
        .into_iter()
        .filter_map(|(kind, list)| list.as_deref().map(|list| filter_by_name(kind, list)))
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            target,
            target_root,
            max_depth: (cli.depth > 0).then_some(cli.depth),
            request_timeout: Duration::from_secs(cli.timeout),
            total_timeout: (cli.total_timeout > 0).then(|| Duration::from_secs(cli.total_timeout)),
            headers,
            wordlist,
            parallel: cli.limit,
            random_agent: cli.random_agent,
            proxy,
            subdomains: cli.subdomains,
            no_redirect: cli.no_redirect,
            render_pages: cli.chrome,
            use_browser: !cli.no_browser,
            ignore_query: cli.ignore_query,
            filters: FilterChain::new(filters),
            filter_scope: if cli.filter_halts_discovery {
                FilterScope::Discovery
            } else {
                FilterScope::Output
            },
        })
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: self.request_timeout,
            proxy: self.proxy.clone(),
            headers: self.headers.clone(),
            random_agent: self.random_agent,
        }
    }

    pub fn chrome_options(&self) -> ChromeOptions {
        let user_agent = self
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| value.clone());

        ChromeOptions {
            timeout: self.request_timeout,
            proxy: self.proxy.clone(),
            user_agent,
        }
    }
}

fn parse_target(raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidTarget(raw.to_string());
    let url = Url::parse(raw).map_err(|_| invalid())?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(invalid()),
    }
}

// "Name: value" -> ("Name", "value")
fn parse_header(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidHeader(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Result<CrawlConfig, ConfigError> {
        let argv = std::iter::once("endpoint-scout").chain(args.iter().copied());
        CrawlConfig::from_cli(Cli::parse_from(argv))
    }

    #[test]
    fn test_valid_config() {
        let config = config(&[
            "https://app.example.com:8443/portal/index.html",
            "-H",
            "Authorization: Bearer a:b",
            "--depth",
            "3",
            "--total-timeout",
            "60",
            "--filter-status",
            "404",
        ])
        .unwrap();

        assert_eq!(config.target_root.as_str(), "https://app.example.com:8443/");
        assert_eq!(
            config.headers,
            vec![("Authorization".to_string(), "Bearer a:b".to_string())]
        );
        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.total_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.filters.describe(), vec!["status: 404"]);
        assert_eq!(config.filter_scope, FilterScope::Output);
        assert!(config.use_browser);
    }

    #[test]
    fn test_defaults_mean_unlimited() {
        let config = config(&["http://example.com"]).unwrap();
        assert_eq!(config.max_depth, None);
        assert_eq!(config.total_timeout, None);
        assert!(config.filters.is_empty());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(config(&["example.com"]), Err(ConfigError::InvalidTarget(_))));
        assert!(matches!(config(&["ftp://example.com/"]), Err(ConfigError::InvalidTarget(_))));
        assert!(matches!(
            config(&["http://example.com", "--proxy", "not a url"]),
            Err(ConfigError::InvalidProxy(_))
        ));
        assert!(matches!(
            config(&["http://example.com", "-H", "NoColon"]),
            Err(ConfigError::InvalidHeader(_))
        ));
        assert!(matches!(
            config(&["http://example.com", "--filter-length", "1,x"]),
            Err(ConfigError::Filter(_))
        ));
        assert!(matches!(
            config(&["http://example.com", "-w", "/definitely/not/here.txt"]),
            Err(ConfigError::Wordlist { .. })
        ));
        assert!(matches!(
            config(&["http://example.com", "--chrome", "--no-browser"]),
            Err(ConfigError::ChromeWithoutBrowser)
        ));
        assert!(matches!(
            config(&["http://example.com", "--limit", "0"]),
            Err(ConfigError::ZeroLimit)
        ));
    }

    #[test]
    fn test_chrome_options_reuse_user_agent_header() {
        let config = config(&["http://example.com", "-H", "User-Agent: scout/1.0"]).unwrap();
        assert_eq!(config.chrome_options().user_agent.as_deref(), Some("scout/1.0"));
    }
}

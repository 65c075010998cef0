// src/fetch/http.rs
// =============================================================================
// The reqwest-backed fetch engine.
//
// Key functionality:
// - One shared Client (connection pooling) for both crawl lanes
// - Per-request timeout, optional proxy, TLS verification disabled
//   (targets are often staging hosts with self-signed certificates)
// - Redirects are followed only while the redirect gate approves the next
//   hop, so two pages redirecting to the same place fetch it once
// - Failures are categorised into FetchError variants
// =============================================================================

use super::{FetchError, FetchRequest, FetchedResponse, Fetcher};
use anyhow::{Context, Result};
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, Proxy};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const MAX_REDIRECTS: usize = 10;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const USER_AGENTS: &[&str] = &[
    DEFAULT_USER_AGENT,
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) \
     Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51",
];

// Decides whether a redirect hop to the given URL may be followed.
// The crawler's gate checks scope and claims the URL in its visited set.
pub type RedirectGate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

// Transport settings taken from the validated configuration
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub proxy: Option<Url>,
    pub headers: Vec<(String, String)>,
    pub random_agent: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            proxy: None,
            headers: Vec::new(),
            random_agent: false,
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    random_agent: bool,
}

impl HttpFetcher {
    // Builds the shared client.
    //
    // `gate` = None disables redirect following entirely: 3xx responses are
    // handed back to the crawler as they are.
    pub fn new(options: &FetchOptions, gate: Option<RedirectGate>) -> Result<Self> {
        let policy = match gate {
            None => Policy::none(),
            Some(gate) => Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.error("too many redirects")
                } else if gate(attempt.url().as_str()) {
                    attempt.follow()
                } else {
                    // Hand the 3xx back to the crawler
                    attempt.stop()
                }
            }),
        };

        let mut default_headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name '{name}'"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("invalid value for header '{name}'"))?;
            default_headers.insert(name, value);
        }

        let mut builder = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.timeout)
            .danger_accept_invalid_certs(true)
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(default_headers)
            .redirect(policy);

        if let Some(proxy) = &options.proxy {
            builder = builder.proxy(
                Proxy::all(proxy.as_str())
                    .with_context(|| format!("invalid proxy URL '{proxy}'"))?,
            );
        }

        let client = builder.build().context("failed to create HTTP client")?;

        Ok(Self {
            client,
            random_agent: options.random_agent,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedResponse, FetchError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);

        if self.random_agent {
            if let Some(agent) = USER_AGENTS.choose(&mut rand::rng()) {
                builder = builder.header(USER_AGENT, *agent);
            }
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(categorize_error)?;

        let url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(categorize_error)?.to_vec();

        Ok(FetchedResponse {
            url,
            status,
            headers,
            body,
        })
    }
}

// Categorizes different error types from reqwest
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Too many redirects
fn categorize_error(error: reqwest::Error) -> FetchError {
    let message = error.to_string();

    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_redirect() {
        FetchError::TooManyRedirects
    } else if error.is_connect() {
        if message.contains("dns") {
            FetchError::Dns
        } else {
            FetchError::Connect
        }
    } else if message.contains("certificate") || message.contains("tls") {
        FetchError::Tls
    } else {
        FetchError::Other(message)
    }
}

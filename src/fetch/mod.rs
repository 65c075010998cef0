// src/fetch/mod.rs
// =============================================================================
// The fetch engine: everything that turns a request into a response.
//
// The crawler only talks to the `Fetcher` trait, so the pipeline can be
// driven by the real reqwest client (http.rs) or by an in-memory fake in
// tests.
//
// Rust concepts:
// - Traits: the seam between the crawler and the network
// - impl Future + Send: async trait methods usable from spawned tasks
// =============================================================================

mod http;

use reqwest::header::{HeaderMap, CONTENT_TYPE, LOCATION};
use reqwest::Method;
use std::borrow::Cow;
use std::future::Future;
use thiserror::Error;

pub use http::{FetchOptions, HttpFetcher, RedirectGate};

// Why a request failed before a response arrived
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("could not resolve hostname")]
    Dns,
    #[error("connection failed")]
    Connect,
    #[error("TLS error")]
    Tls,
    #[error("{0}")]
    Other(String),
}

// One outgoing HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    /// Per-request headers, applied on top of the configured ones
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    // Identity used by the visited set: plain URL for GET, "METHOD URL"
    // otherwise so a synthesised POST to an already crawled path still runs.
    pub fn visit_key(&self) -> String {
        if self.method == Method::GET {
            self.url.clone()
        } else {
            format!("{} {}", self.method, self.url)
        }
    }
}

// A completed exchange, whatever its status code
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Final URL (after any redirects the engine followed)
    pub url: String,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    pub fn content_type(&self) -> &str {
        self.header(CONTENT_TYPE.as_str()).unwrap_or_default()
    }

    pub fn location(&self) -> Option<&str> {
        self.header(LOCATION.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

// Performs HTTP exchanges for the crawler.
//
// Implementations own transport concerns: timeouts, proxying, TLS and
// redirect following.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<FetchedResponse, FetchError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_key() {
        let get = FetchRequest::get("http://example.com/users");
        assert_eq!(get.visit_key(), "http://example.com/users");

        let post = FetchRequest {
            method: Method::POST,
            ..get.clone()
        };
        assert_eq!(post.visit_key(), "POST http://example.com/users");
    }

    #[test]
    fn test_response_helpers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        headers.insert(LOCATION, "http://example.com/docs/".parse().unwrap());

        let response = FetchedResponse {
            url: "http://example.com/docs".to_string(),
            status: 301,
            headers,
            body: b"moved".to_vec(),
        };

        assert_eq!(response.content_type(), "application/json");
        assert_eq!(response.location(), Some("http://example.com/docs/"));
        assert_eq!(response.text(), "moved");
        assert!(response.is_redirect());
        assert!(!response.is_success());
    }
}

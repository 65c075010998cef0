// src/util/links.rs
// =============================================================================
// URL helpers used everywhere links are discovered.
//
// - resolve: joins a discovered reference onto a base URL, dropping path
//   segments the base already contains (sites whose router echoes its own
//   base path would otherwise produce /api/v2/v2/v2/... forever)
// - extension: lower-cased ".ext" of a URL path
// - hostname / is_absolute: validation helpers for the CLI
// - SubdomainMatcher: accepts hosts below the target's parent domain
// =============================================================================

use regex::Regex;
use thiserror::Error;
use url::{Position, Url};

#[derive(Debug, Error)]
pub enum UrlError {
    #[error("input must be a valid absolute URL: {0}")]
    NotAbsolute(String),

    #[error("hostname has no parent domain: {0}")]
    NoParentDomain(String),

    #[error("could not build subdomain pattern: {0}")]
    Pattern(#[from] regex::Error),
}

// Resolves `reference` against `base`.
//
// Relative references lose every path segment that also appears in the
// base path before being joined:
//   base      = http://x/api/v2/
//   reference = /v2/something/get
//   result    = http://x/api/v2/something/get
//
// Absolute and scheme-relative (//host/path) references are joined as-is.
// Returns None when the reference cannot be joined.
pub fn resolve(base: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();

    if reference.starts_with("//") || Url::parse(reference).is_ok() {
        return base.join(reference).ok().map(String::from);
    }

    let base_segments: Vec<&str> = base.path().trim_start_matches('/').split('/').collect();
    let kept: Vec<&str> = reference
        .trim_start_matches('/')
        .split('/')
        .filter(|segment| !base_segments.contains(segment))
        .collect();

    base.join(&kept.join("/")).ok().map(String::from)
}

// Returns the lower-cased extension of the URL's path, including the dot.
//
// Examples:
//   "http://x/path/test.jsp" -> ".jsp"
//   "http://x/app.JS?v=2"    -> ".js"
//   "http://x/api/users"     -> ""
pub fn extension(raw: &str) -> String {
    let path = match Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        // Relative input: cut off query and fragment by hand
        Err(_) => raw.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rfind('.') {
        Some(dot) => last_segment[dot..].to_ascii_lowercase(),
        None => String::new(),
    }
}

pub fn is_absolute(raw: &str) -> bool {
    Url::parse(raw).is_ok()
}

// Extracts the hostname from an absolute URL
pub fn hostname(raw: &str) -> Result<String, UrlError> {
    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .ok_or_else(|| UrlError::NotAbsolute(raw.to_string()))
}

// "scheme://host[:port]/path" with the query, fragment and any trailing
// slash removed.
pub fn strip_query(url: &Url) -> String {
    url[..Position::AfterPath].trim_end_matches('/').to_string()
}

// Appends a path segment to the base URL's path (wordlist seeding).
//
//   join_path("http://x/app/", "/admin") -> http://x/app/admin
pub fn join_path(base: &Url, segment: &str) -> Result<Url, UrlError> {
    if base.cannot_be_a_base() {
        return Err(UrlError::NotAbsolute(base.to_string()));
    }

    let mut joined = base.clone();
    let path = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        segment.trim().trim_start_matches('/')
    );
    joined.set_path(&path);
    Ok(joined)
}

// Matches hosts that live under the parent domain of a given hostname.
//
// Built from "www.example.com" it accepts "api.example.com" and
// "a.b.example.com" but rejects "example.com" and "www.example.com" itself.
//
// Only the first label is treated as the host part; there is no public
// suffix list, so a target like "shop.co.uk" yields the parent "co.uk".
#[derive(Debug, Clone)]
pub struct SubdomainMatcher {
    own_host: String,
    pattern: Regex,
}

impl SubdomainMatcher {
    // Accepts either a bare hostname or a full URL
    pub fn new(host_or_url: &str) -> Result<Self, UrlError> {
        let own_host = if host_or_url.contains("://") {
            hostname(host_or_url)?
        } else {
            host_or_url.to_string()
        }
        .to_ascii_lowercase();

        let parent = match own_host.split_once('.') {
            Some((_, rest)) if !rest.is_empty() => rest.to_string(),
            _ => return Err(UrlError::NoParentDomain(own_host)),
        };

        let pattern = Regex::new(&format!(r"^(?:[^./:]+\.)+{}$", regex::escape(&parent)))?;

        Ok(Self { own_host, pattern })
    }

    // `candidate` may be a hostname or a URL
    pub fn is_match(&self, candidate: &str) -> bool {
        let host = if candidate.contains("://") {
            match hostname(candidate) {
                Ok(host) => host,
                Err(_) => return false,
            }
        } else {
            candidate.to_string()
        }
        .to_ascii_lowercase();

        host != self.own_host && self.pattern.is_match(&host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_collapses_overlapping_segments() {
        let base = Url::parse("http://example.com/api/v2/").unwrap();
        assert_eq!(
            resolve(&base, "/v2/something/get").as_deref(),
            Some("http://example.com/api/v2/something/get")
        );
    }

    #[test]
    fn test_resolve_root_base() {
        let base = Url::parse("http://example.com/").unwrap();
        assert_eq!(
            resolve(&base, "/v2/api-docs").as_deref(),
            Some("http://example.com/v2/api-docs")
        );
        assert_eq!(
            resolve(&base, "chunks/app.js").as_deref(),
            Some("http://example.com/chunks/app.js")
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_references() {
        let base = Url::parse("http://example.com/api/").unwrap();
        assert_eq!(
            resolve(&base, "https://cdn.example.com/api/app.js").as_deref(),
            Some("https://cdn.example.com/api/app.js")
        );
        assert_eq!(
            resolve(&base, "//cdn.example.com/lib.js").as_deref(),
            Some("http://cdn.example.com/lib.js")
        );
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("http://www.example.com/path/test.jsp"), ".jsp");
        assert_eq!(extension("http://www.example.com/path/test.php"), ".php");
        assert_eq!(extension("http://www.example.com/static/App.JS?v=3"), ".js");
        assert_eq!(extension("http://www.example.com/api/users"), "");
        assert_eq!(extension("/relative/data.json#top"), ".json");
    }

    #[test]
    fn test_hostname() {
        assert_eq!(hostname("http://www.example.com").unwrap(), "www.example.com");
        assert!(hostname("/not/absolute").is_err());
        assert!(is_absolute("https://example.com/x"));
        assert!(!is_absolute("example.com/x"));
    }

    #[test]
    fn test_subdomain_matcher() {
        let matcher = SubdomainMatcher::new("http://www.example.com").unwrap();
        assert!(matcher.is_match("sub.example.com"));
        assert!(matcher.is_match("test.sub.example.com"));
        assert!(matcher.is_match("https://api.example.com/v1/users"));
        assert!(!matcher.is_match("example.com"));
        assert!(!matcher.is_match("www.example.com"));
        assert!(!matcher.is_match("evil-example.com"));
        assert!(!matcher.is_match("sub.example.com.evil.net"));
    }

    #[test]
    fn test_subdomain_matcher_needs_parent() {
        assert!(SubdomainMatcher::new("localhost").is_err());
    }

    #[test]
    fn test_strip_query() {
        let url = Url::parse("http://example.com:8080/search/?q=rust#top").unwrap();
        assert_eq!(strip_query(&url), "http://example.com:8080/search");
    }

    #[test]
    fn test_join_path() {
        let base = Url::parse("http://example.com/app/").unwrap();
        assert_eq!(
            join_path(&base, "/admin").unwrap().as_str(),
            "http://example.com/app/admin"
        );
        let base = Url::parse("http://example.com").unwrap();
        assert_eq!(
            join_path(&base, "backup.zip").unwrap().as_str(),
            "http://example.com/backup.zip"
        );
    }
}

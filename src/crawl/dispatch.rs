// src/crawl/dispatch.rs
// =============================================================================
// Where a discovered link goes, if anywhere.
//
// - Lane: scripts, JSON and Swagger resource listings are fetched on the
//   script lane (mined with the JavaScript extractors), everything else on
//   the content lane (HTML, sitemap, robots).
// - Scope: the target host, plus its sibling subdomains with --subdomains.
// - Static assets (images, fonts, media) are never fetched at all.
// - Redirect hops the HTTP client wants to follow pass the same checks.
// =============================================================================

use super::state::CrawlState;
use crate::config::CrawlConfig;
use crate::fetch::{FetchRequest, RedirectGate};
use crate::util::{extension, SubdomainMatcher};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

static STATIC_ASSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\.(png|apng|bmp|gif|ico|cur|jpg|jpeg|jfif|pjp|pjpeg|svg|tif|tiff|webp|xbm",
        r"|3gp|aac|flac|mpg|mpeg|mp3|mp4|m4a|m4v|m4p|oga|ogg|ogv|mov|wav|webm",
        r"|eot|woff|woff2|ttf|otf)(?:\?|#|$)",
    ))
    .expect("valid static asset regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Content,
    Script,
}

// Picks the lane for a URL
//
// Examples:
//   ".../static/app.js"             -> Script
//   ".../v2/api-docs.json"          -> Script
//   ".../swagger-resources"         -> Script
//   ".../login"                     -> Content
pub fn route(url: &str) -> Lane {
    let ext = extension(url);
    if ext == ".js" || ext == ".json" || url.ends_with("swagger-resources") {
        Lane::Script
    } else {
        Lane::Content
    }
}

pub fn is_static_asset(url: &str) -> bool {
    STATIC_ASSET.is_match(url)
}

// One request waiting to be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub request: FetchRequest,
    /// None = decide with `route` at dispatch time
    pub lane: Option<Lane>,
    /// Link hops from the seeds
    pub depth: usize,
}

impl FrontierEntry {
    pub fn link(url: impl Into<String>, depth: usize) -> Self {
        Self {
            request: FetchRequest::get(url),
            lane: None,
            depth,
        }
    }

    pub fn on_lane(mut self, lane: Lane) -> Self {
        self.lane = Some(lane);
        self
    }

    pub fn lane(&self) -> Lane {
        self.lane.unwrap_or_else(|| route(&self.request.url))
    }
}

// Which hosts the crawl may touch
#[derive(Debug, Clone)]
pub struct Scope {
    host: String,
    subdomains: Option<SubdomainMatcher>,
}

impl Scope {
    pub fn new(target: &Url, subdomains: bool) -> Self {
        let host = target.host_str().unwrap_or_default().to_ascii_lowercase();

        let subdomains = if subdomains {
            match SubdomainMatcher::new(&host) {
                Ok(matcher) => Some(matcher),
                Err(e) => {
                    warn!("subdomain crawling disabled: {e}");
                    None
                }
            }
        } else {
            None
        };

        Self { host, subdomains }
    }

    pub fn allows(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };

        host.eq_ignore_ascii_case(&self.host)
            || self
                .subdomains
                .as_ref()
                .is_some_and(|matcher| matcher.is_match(host))
    }
}

// Builds the fetcher's redirect gate: a hop is followed only when its
// target is in scope, not a static asset, and not yet claimed by the crawl.
pub fn redirect_gate(config: &CrawlConfig, state: Arc<CrawlState>) -> RedirectGate {
    let scope = Scope::new(&config.target, config.subdomains);

    Arc::new(move |target: &str| {
        let allowed = Url::parse(target).is_ok_and(|url| scope.allows(&url))
            && !is_static_asset(target);
        if !allowed {
            debug!("not following redirect to {target}");
            return false;
        }
        state.claim(target)
    })
}

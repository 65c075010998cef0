// src/crawl/runner.rs
// =============================================================================
// The crawl coordinator.
//
// How it works:
// 1. Seed the frontier with the target (plus one URL per wordlist entry)
// 2. Every link that passes scope, asset, depth and visited checks becomes
//    its own task on a JoinSet
// 3. A task waits for a permit on its lane (content or script), fetches,
//    then mines the response for new links
// 4. The links a task returns are dispatched as soon as it finishes
// 5. The crawl is done when the JoinSet drains, or when the total timeout
//    fires first
//
// Each lane has its own semaphore, so a slow page render never starves
// script mining and vice versa.
//
// Rust concepts:
// - Generics: the coordinator works with any Fetcher and ScriptEngine
// - Arc<Self> receivers: tasks own a handle to the shared crawl context
// - JoinSet: a dynamic set of spawned tasks we can await one by one
// =============================================================================

use super::dispatch::{is_static_asset, FrontierEntry, Lane, Scope};
use super::state::CrawlState;
use crate::browser::ScriptEngine;
use crate::config::{CrawlConfig, FilterScope};
use crate::fetch::{FetchRequest, FetchedResponse, Fetcher};
use crate::finder::{chunks, extract_page, javascript, robots, sitemap, swagger};
use crate::output::{log_response, ResponseRecord};
use crate::util::{dedup, join_path, resolve, strip_query};
use reqwest::Method;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};
use url::Url;

// Title served by the stock Swagger UI page
const SWAGGER_UI_TITLE: &str = "Swagger UI";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    Completed,
    TimedOut,
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlOutcome::Completed => write!(f, "completed"),
            CrawlOutcome::TimedOut => write!(f, "timed-out"),
        }
    }
}

// Final counters of one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub visited: usize,
    pub errors: u64,
    pub emitted: u64,
    pub outcome: CrawlOutcome,
}

pub struct Coordinator<F, E> {
    shared: Arc<Shared<F, E>>,
    seeds: Vec<FrontierEntry>,
}

// Everything a visit task needs
struct Shared<F, E> {
    config: CrawlConfig,
    fetcher: Arc<F>,
    engine: Option<Arc<E>>,
    state: Arc<CrawlState>,
    scope: Scope,
    content_permits: Semaphore,
    script_permits: Semaphore,
}

impl<F: Fetcher, E: ScriptEngine> Coordinator<F, E> {
    // `state` is passed in because the fetcher's redirect gate claims URLs
    // in the same visited set.
    pub fn new(
        mut config: CrawlConfig,
        fetcher: Arc<F>,
        engine: Option<Arc<E>>,
        state: Arc<CrawlState>,
    ) -> Self {
        let mut seeds = vec![FrontierEntry::link(config.target.as_str(), 0)];

        if let Some(mut wordlist) = config.wordlist.take() {
            if !wordlist.is_empty() {
                info!("seeding {} paths from the wordlist", wordlist.len());
            }
            while wordlist.advance() {
                let Some(path) = wordlist.current() else {
                    break;
                };
                match join_path(&config.target, path) {
                    Ok(url) => seeds.push(FrontierEntry::link(url.as_str(), 0)),
                    Err(e) => warn!("skipping wordlist entry '{path}': {e}"),
                }
            }
        }

        let scope = Scope::new(&config.target, config.subdomains);
        let parallel = config.parallel;

        Self {
            shared: Arc::new(Shared {
                config,
                fetcher,
                engine,
                state,
                scope,
                content_permits: Semaphore::new(parallel),
                script_permits: Semaphore::new(parallel),
            }),
            seeds,
        }
    }

    // Runs the crawl to completion or until the total timeout.
    //
    // On timeout the crawl task is left running detached; the summary is a
    // snapshot of the counters at that moment.
    pub async fn execute(self) -> CrawlSummary {
        let state = Arc::clone(&self.shared.state);
        let total_timeout = self.shared.config.total_timeout;
        info!(
            seeds = self.seeds.len(),
            parallel = self.shared.config.parallel,
            "crawling {}",
            self.shared.config.target
        );

        let mut crawl = tokio::spawn(crawl(self.shared, self.seeds));

        let outcome = match total_timeout {
            None => finished(crawl.await),
            Some(limit) => match tokio::time::timeout(limit, &mut crawl).await {
                Ok(joined) => finished(joined),
                Err(_) => {
                    error!("total timeout of {}s reached", limit.as_secs());
                    CrawlOutcome::TimedOut
                }
            },
        };

        CrawlSummary {
            visited: state.visited_count(),
            errors: state.error_count(),
            emitted: state.emitted(),
            outcome,
        }
    }
}

fn finished(joined: Result<(), JoinError>) -> CrawlOutcome {
    if let Err(e) = joined {
        error!("crawl task failed: {e}");
    }
    CrawlOutcome::Completed
}

async fn crawl<F: Fetcher, E: ScriptEngine>(shared: Arc<Shared<F, E>>, seeds: Vec<FrontierEntry>) {
    let mut tasks = JoinSet::new();
    for seed in seeds {
        shared.dispatch(&mut tasks, seed);
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(followups) => {
                for entry in followups {
                    shared.dispatch(&mut tasks, entry);
                }
            }
            Err(e) => error!("visit task failed: {e}"),
        }
    }
}

impl<F: Fetcher, E: ScriptEngine> Shared<F, E> {
    // Spawns a visit for `entry` unless it is filtered out or already claimed
    fn dispatch(self: &Arc<Self>, tasks: &mut JoinSet<Vec<FrontierEntry>>, mut entry: FrontierEntry) {
        let Ok(url) = Url::parse(&entry.request.url) else {
            debug!("dropping unparsable link {}", entry.request.url);
            return;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return;
        }
        if !self.scope.allows(&url) {
            debug!("out of scope: {url}");
            return;
        }
        if is_static_asset(url.as_str()) {
            return;
        }
        if self.config.max_depth.is_some_and(|max| entry.depth > max) {
            return;
        }

        entry.request.url = url.into();
        if !self.state.claim(&entry.request.visit_key()) {
            return;
        }

        debug!(
            lane = ?entry.lane(),
            depth = entry.depth,
            "queue {} {}",
            entry.request.method,
            entry.request.url
        );
        tasks.spawn(Arc::clone(self).visit(entry));
    }

    // Fetches one entry and returns the links found in its response
    async fn visit(self: Arc<Self>, entry: FrontierEntry) -> Vec<FrontierEntry> {
        let lane = entry.lane();
        let permits = match lane {
            Lane::Content => &self.content_permits,
            Lane::Script => &self.script_permits,
        };
        let Ok(_permit) = permits.acquire().await else {
            return Vec::new();
        };

        let response = match self.fetcher.fetch(&entry.request).await {
            Ok(response) => response,
            Err(e) => {
                let errors = self.state.record_error();
                warn!(error = errors, "{} {}: {e}", entry.request.method, entry.request.url);
                return Vec::new();
            }
        };

        if response.is_redirect() {
            return self.redirect(&entry, &response);
        }

        if !response.is_success() {
            let errors = self.state.record_error();
            if !self.config.filters.suppresses(&response) {
                warn!(
                    code = response.status,
                    length = response.body.len(),
                    error = errors,
                    "{}",
                    response.url
                );
            }
            return Vec::new();
        }

        if !self.state.first_of_length(response.body.len()) {
            debug!(length = response.body.len(), "{} repeats a seen length", response.url);
            return Vec::new();
        }

        let suppressed = self.config.filters.suppresses(&response);
        let (followups, title) =
            if suppressed && self.config.filter_scope == FilterScope::Discovery {
                (Vec::new(), None)
            } else {
                self.extract(&entry, lane, &response).await
            };

        if entry.request.method == Method::GET {
            self.state.mark_visited(&response.url);
        }

        if !suppressed {
            self.state.record_emitted();
            log_response(&ResponseRecord {
                url: response.url.clone(),
                code: response.status,
                length: response.body.len(),
                errors: self.state.error_count(),
                title,
            });
        }

        followups
    }

    // A 3xx the fetcher did not follow
    fn redirect(&self, entry: &FrontierEntry, response: &FetchedResponse) -> Vec<FrontierEntry> {
        let location = response
            .location()
            .and_then(|location| Url::parse(&response.url).ok()?.join(location).ok());

        let Some(location) = location else {
            let errors = self.state.record_error();
            warn!(code = response.status, error = errors, "{} redirects nowhere", response.url);
            return Vec::new();
        };

        // "/docs" -> "/docs/" is the same resource
        if location.as_str() == format!("{}/", response.url) {
            let mut next = entry.clone();
            next.request.url = location.into();
            return vec![next];
        }

        if self.config.no_redirect {
            let errors = self.state.record_error();
            if !self.config.filters.suppresses(response) {
                warn!(
                    code = response.status,
                    error = errors,
                    "skip redirection: {} -> {}",
                    response.url,
                    location
                );
            }
        } else {
            debug!("redirect from {} to {} not followed", response.url, location);
        }

        Vec::new()
    }

    async fn extract(
        &self,
        entry: &FrontierEntry,
        lane: Lane,
        response: &FetchedResponse,
    ) -> (Vec<FrontierEntry>, Option<String>) {
        let Ok(page_url) = Url::parse(&response.url) else {
            return (Vec::new(), None);
        };
        let depth = entry.depth + 1;
        let text = response.text();
        let mut found = Vec::new();

        if swagger::is_swagger(response.content_type(), &text) {
            found.extend(self.swagger_requests(&page_url, response, depth));
        }

        let title = match lane {
            Lane::Content => {
                self.extract_content(&page_url, response, &text, depth, &mut found)
                    .await
            }
            Lane::Script => {
                self.extract_script(&page_url, &text, depth, &mut found).await;
                None
            }
        };

        (found, title)
    }

    // HTML pages, sitemaps and robots.txt. Returns the page title.
    async fn extract_content(
        &self,
        page_url: &Url,
        response: &FetchedResponse,
        text: &str,
        depth: usize,
        found: &mut Vec<FrontierEntry>,
    ) -> Option<String> {
        let content_type = response.content_type().to_ascii_lowercase();
        let mut title = None;

        if content_type.contains("html") {
            let rendered = match (&self.engine, self.config.render_pages) {
                (Some(engine), true) => match engine.render(page_url.as_str()).await {
                    Ok(html) => Some(html),
                    Err(e) => {
                        warn!("rendering {page_url} failed: {e}");
                        None
                    }
                },
                _ => None,
            };

            let page = extract_page(rendered.as_deref().unwrap_or(text), page_url);

            for anchor in page.anchors {
                let link = if self.config.ignore_query {
                    Url::parse(&anchor)
                        .map(|url| strip_query(&url))
                        .unwrap_or(anchor)
                } else {
                    anchor
                };
                found.push(FrontierEntry::link(link, depth));
            }
            found.extend(
                page.scripts
                    .into_iter()
                    .map(|script| FrontierEntry::link(script, depth).on_lane(Lane::Script)),
            );
            found.extend(page.forms.into_iter().map(|form| FrontierEntry::link(form, depth)));

            if page.title.as_deref() == Some(SWAGGER_UI_TITLE)
                && page_url.path().ends_with("swagger-ui.html")
            {
                if let Ok(resources) = page_url.join("swagger-resources") {
                    found.push(FrontierEntry::link(resources.as_str(), depth).on_lane(Lane::Script));
                }
            }

            title = page.title;
        }

        if content_type.contains("xml") {
            found.extend(
                sitemap::find_links(text)
                    .into_iter()
                    .map(|link| FrontierEntry::link(link, depth)),
            );
        }

        if response.status == 200 && page_url.path() == "/robots.txt" {
            for path in robots::find_links(text) {
                if let Ok(link) = page_url.join(&path) {
                    found.push(FrontierEntry::link(link.as_str(), depth));
                }
            }
        }

        title
    }

    // Scripts and JSON: runtime chunk names first, then the static link finder.
    // "./x" is relative to the script itself, everything else to the target root.
    async fn extract_script(
        &self,
        script_url: &Url,
        text: &str,
        depth: usize,
        found: &mut Vec<FrontierEntry>,
    ) {
        let mut links = Vec::new();

        if let Some(engine) = &self.engine {
            if chunks::has_chunk_loader(text) {
                let resolved = chunks::resolve_chunks(text, engine.as_ref()).await;
                debug!("resolved {} chunk names in {script_url}", resolved.len());
                links.extend(resolved);
            }
        }
        links.extend(javascript::find_links(text));

        for link in dedup(links) {
            let base = if link.starts_with("./") {
                script_url
            } else {
                &self.config.target_root
            };
            if let Some(url) = resolve(base, &link) {
                found.push(FrontierEntry::link(url, depth));
            }
        }
    }

    // One entry per documented operation, DELETE excluded
    fn swagger_requests(
        &self,
        document_url: &Url,
        response: &FetchedResponse,
        depth: usize,
    ) -> Vec<FrontierEntry> {
        let apis = match swagger::find_apis(&response.body) {
            Ok(apis) => apis,
            Err(e) => {
                warn!("cannot read Swagger document {document_url}: {e}");
                return Vec::new();
            }
        };
        info!("found {} operations in {document_url}", apis.len());

        apis.into_iter()
            .filter(|api| api.method != "DELETE")
            .filter_map(|api| {
                let url = resolve(document_url, &api.url)?;
                let Ok(method) = Method::from_bytes(api.method.as_bytes()) else {
                    debug!("skipping operation with method {}", api.method);
                    return None;
                };
                Some(FrontierEntry {
                    request: FetchRequest {
                        method,
                        url,
                        headers: api.headers.into_iter().collect(),
                        body: api.body,
                    },
                    lane: None,
                    depth,
                })
            })
            .collect()
    }
}

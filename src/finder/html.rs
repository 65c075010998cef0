// src/finder/html.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// One parse of the document yields everything the crawler wants from it:
// - <a href>      -> pages (content lane)
// - <script src>  -> scripts (always the script lane)
// - <form action> -> form targets
// - <title>       -> shown in the log record, and used to spot Swagger UI
//
// Relative references are resolved the way a browser does (Url::join),
// against the URL the page was actually served from.
//
// Rust concepts:
// - scraper::Html is not Send: it is parsed and dropped inside this
//   synchronous function, never held across an .await
// - Lazy statics: CSS selectors are compiled once
// =============================================================================

use crate::util::filter_newlines;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

static ANCHORS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static SCRIPTS: Lazy<Selector> = Lazy::new(|| selector("script[src]"));
static FORMS: Lazy<Selector> = Lazy::new(|| selector("form[action]"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));

// Our selectors are constants, so a parse failure is a programmer error
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

// Everything discovered on one page (absolute URLs)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageLinks {
    pub anchors: Vec<String>,
    pub scripts: Vec<String>,
    pub forms: Vec<String>,
    pub title: Option<String>,
}

// Parses `html` served from `page_url` and collects its links
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   page_url = "https://example.com/index.html"
//   anchors = ["https://example.com/docs"]
pub fn extract_page(html: &str, page_url: &Url) -> PageLinks {
    let document = Html::parse_document(html);

    let collect = |selector: &Selector, attribute: &str| -> Vec<String> {
        document
            .select(selector)
            .filter_map(|element| element.value().attr(attribute))
            .filter_map(|reference| resolve_reference(page_url, reference))
            .collect()
    };

    let title = document
        .select(&TITLE)
        .next()
        .map(|element| filter_newlines(&element.text().collect::<String>()))
        .filter(|title| !title.is_empty());

    PageLinks {
        anchors: collect(&ANCHORS, "href"),
        scripts: collect(&SCRIPTS, "src"),
        forms: collect(&FORMS, "action"),
        title,
    }
}

// Resolves a (possibly relative) reference to an absolute URL
//
// We skip:
// - in-page anchors (#section)
// - mailto:, tel:, javascript: and data: links
fn resolve_reference(base: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();
    let lowered = reference.to_ascii_lowercase();

    if reference.is_empty()
        || reference.starts_with('#')
        || ["mailto:", "tel:", "javascript:", "data:"]
            .iter()
            .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    base.join(reference).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/app/index.html").unwrap()
    }

    #[test]
    fn test_extracts_every_link_kind() {
        let html = r#"
            <html><head>
              <title>
                Admin Console
              </title>
              <script src="/static/app.js"></script>
              <script>inline()</script>
            </head><body>
              <a href="users">Users</a>
              <a href="https://other.example.org/">Elsewhere</a>
              <form action="/login" method="post"></form>
            </body></html>
        "#;

        let links = extract_page(html, &page());
        assert_eq!(
            links.anchors,
            vec!["https://example.com/app/users", "https://other.example.org/"]
        );
        assert_eq!(links.scripts, vec!["https://example.com/static/app.js"]);
        assert_eq!(links.forms, vec!["https://example.com/login"]);
        assert_eq!(links.title.as_deref(), Some("Admin Console"));
    }

    #[test]
    fn test_skips_non_http_references() {
        let html = r##"
            <a href="#top">Top</a>
            <a href="mailto:test@example.com">Email</a>
            <a href="JavaScript:void(0)">Nothing</a>
            <a href="">Empty</a>
        "##;
        let links = extract_page(html, &page());
        assert!(links.anchors.is_empty());
        assert_eq!(links.title, None);
    }
}

// src/finder/javascript.rs
// =============================================================================
// Static link mining from JavaScript (and JSON) sources.
//
// A single composite regex looks inside quoted string literals for five
// shapes of URL:
// 1. absolute:        "https://api.example.com/v1" or "//cdn.example.com/x"
// 2. rooted/relative: "/api/users", "../static/app", "./config"
// 3. path + ext:      "static/js/app.js", "user/login.action?x=1"
// 4. REST-like:       "api/v1/users"
// 5. bare filename:   "config.json", "index.php"
//
// This is a heuristic, not a JavaScript parser: it misses computed URLs and
// reports some strings that only look like paths.
// =============================================================================

use crate::util::dedup;
use once_cell::sync::Lazy;
use regex::Regex;

static LINK_FINDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?:"|')("#,
        // scheme (or //) + domain + rest
        r#"((?:[a-zA-Z]{1,10}://|//)[^"'/]{1,}\.[a-zA-Z]{2,}[^"']{0,})"#,
        r"|",
        // starts with /, ../ or ./
        r#"((?:/|\.\./|\./)[^"'><,;| *()(%%$^/\\\[\]][^"'><,;|()]{1,})"#,
        r"|",
        // relative path with a short extension (or .action) and optional params
        r#"([a-zA-Z0-9_\-/]{1,}/[a-zA-Z0-9_\-/]{1,}\.(?:[a-zA-Z]{1,4}|action)(?:[\?|#][^"|']{0,}|))"#,
        r"|",
        // REST endpoint without extension
        r#"([a-zA-Z0-9_\-/]{1,}/[a-zA-Z0-9_\-/]{3,}(?:[\?|#][^"|']{0,}|))"#,
        r"|",
        // bare filename
        r#"([a-zA-Z0-9_\-]{1,}\.(?:php|asp|aspx|jsp|json|action|html|js|txt|xml)(?:[\?|#][^"|']{0,}|))"#,
        r#")(?:"|')"#,
    ))
    .expect("valid link finder regex")
});

// Returns every link-like string literal in `source`, first occurrence first
pub fn find_links(source: &str) -> Vec<String> {
    dedup(
        LINK_FINDER
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swagger_resources_listing() {
        let source = r#"[{"name":"default","url":"/v2/api-docs","swaggerVersion":"2.0","location":"/v2/api-docs"}]"#;
        assert_eq!(find_links(source), vec!["/v2/api-docs"]);
    }

    #[test]
    fn test_finds_each_link_shape() {
        let source = r#"
            var a = "https://api.example.com/v1/users";
            var b = '/admin/login';
            var c = "static/js/vendor.js";
            var d = "api/v1/accounts";
            var e = "config.json";
        "#;
        assert_eq!(
            find_links(source),
            vec![
                "https://api.example.com/v1/users",
                "/admin/login",
                "static/js/vendor.js",
                "api/v1/accounts",
                "config.json",
            ]
        );
    }

    #[test]
    fn test_ignores_plain_strings() {
        let source = r#"var msg = "hello world"; var n = "x";"#;
        assert!(find_links(source).is_empty());
    }
}

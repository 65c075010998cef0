// src/finder/sitemap.rs
// =============================================================================
// Extracts <loc> entries from sitemap XML.
//
// scraper's HTML parser is lenient enough for the flat urlset/url/loc
// structure of a sitemap; element names are matched case-insensitively.
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static LOC: Lazy<Selector> =
    Lazy::new(|| Selector::parse("urlset url loc").expect("valid sitemap selector"));

pub fn find_links(xml: &str) -> Vec<String> {
    let document = Html::parse_document(xml);

    document
        .select(&LOC)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|link| !link.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_loc_entries() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>http://example.com/</loc><priority>1.0</priority></url>
  <url>
    <loc>
      http://example.com/about
    </loc>
  </url>
</urlset>"#;
        assert_eq!(
            find_links(xml),
            vec!["http://example.com/", "http://example.com/about"]
        );
    }

    #[test]
    fn test_ignores_loc_outside_urlset() {
        let xml = "<sitemapindex><sitemap><loc>http://example.com/s1.xml</loc></sitemap></sitemapindex>";
        assert!(find_links(xml).is_empty());
    }
}

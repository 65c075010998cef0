// src/finder/mod.rs
// =============================================================================
// Link extractors: turn one fetched payload into candidate links.
//
// Submodules:
// - html:       anchors, scripts, forms and the page title
// - robots:     Allow/Disallow paths from robots.txt
// - sitemap:    <loc> entries from sitemap XML
// - javascript: link-like string literals in JS/JSON sources
// - chunks:     bundler chunk names resolved through the script engine
// - swagger:    concrete API calls synthesised from a Swagger 2 document
//
// Apart from chunks::resolve_chunks every extractor is synchronous and
// returns an empty result for input it cannot make sense of.
// =============================================================================

pub mod chunks;
pub mod html;
pub mod javascript;
pub mod robots;
pub mod sitemap;
pub mod swagger;

pub use html::extract_page;

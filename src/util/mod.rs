// src/util/mod.rs
// =============================================================================
// Small, stateless helpers shared by the extractors and the crawler.
//
// Submodules:
// - links: URL resolution, extension lookup, hostname / subdomain matching
// - text: whitespace folding and order-preserving dedup
// =============================================================================

mod links;
mod text;

pub use links::{extension, is_absolute, join_path, resolve, strip_query, SubdomainMatcher};
pub use text::{dedup, filter_newlines};

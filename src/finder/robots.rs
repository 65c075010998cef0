// src/finder/robots.rs
// Paths listed in robots.txt Allow/Disallow rules.

use crate::util::filter_newlines;

// Matches both "Allow: " and "Disallow: " (any case of the first letter)
const RULE_MARKER: &str = "llow: ";

pub fn find_links(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let start = line.find(RULE_MARKER)? + RULE_MARKER.len();
            let path = filter_newlines(&line[start..]);
            (!path.is_empty()).then_some(path)
        })
        .collect()
}

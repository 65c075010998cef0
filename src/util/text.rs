// src/util/text.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t\r\n]+").expect("valid regex"));

// Trims the text and folds tabs / newlines into single spaces
pub fn filter_newlines(text: &str) -> String {
    NEWLINES.replace_all(text.trim(), " ").into_owned()
}

// Removes duplicates, keeping the first occurrence of each item in order
pub fn dedup<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

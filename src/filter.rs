// src/filter.rs
// =============================================================================
// Response filters: predicates that suppress noisy results.
//
// Each filter is built from a comma-separated list given on the command
// line (--filter-status 403,500, --filter-ext png,.css, --filter-length 0)
// and never changes afterwards. A FilterChain evaluates them in the order
// they were configured and stops at the first one that matches.
//
// Rust concepts:
// - Trait objects (Box<dyn ResponseFilter>): one chain, several filter types
// - thiserror: a typed error carrying the token that failed to parse
// =============================================================================

use crate::fetch::FetchedResponse;
use crate::util::extension;
use std::fmt::Display;
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid number '{token}' in filter list")]
    InvalidNumber {
        token: String,
        #[source]
        source: ParseIntError,
    },

    #[error("unknown filter kind '{0}'")]
    UnknownKind(String),
}

pub trait ResponseFilter: Send + Sync {
    // true = suppress this response
    fn matches(&self, response: &FetchedResponse) -> bool;

    // Human readable form, e.g. "status: 403,500"
    fn describe(&self) -> String;
}

// Builds a filter from its kind name ("status", "extension", "length")
pub fn filter_by_name(kind: &str, input: &str) -> Result<Box<dyn ResponseFilter>, FilterError> {
    match kind {
        "status" => Ok(Box::new(StatusFilter::parse(input)?)),
        "extension" | "ext" => Ok(Box::new(ExtensionFilter::parse(input))),
        "length" => Ok(Box::new(LengthFilter::parse(input)?)),
        other => Err(FilterError::UnknownKind(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    codes: Vec<u16>,
}

impl StatusFilter {
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        Ok(Self {
            codes: parse_numbers(input)?,
        })
    }
}

impl ResponseFilter for StatusFilter {
    fn matches(&self, response: &FetchedResponse) -> bool {
        self.codes.contains(&response.status)
    }

    fn describe(&self) -> String {
        format!("status: {}", join(&self.codes))
    }
}

// Extensions are stored with a leading dot and lower-cased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    pub fn parse(input: &str) -> Self {
        let extensions = input
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                let token = token.to_ascii_lowercase();
                if token.starts_with('.') {
                    token
                } else {
                    format!(".{token}")
                }
            })
            .collect();

        Self { extensions }
    }
}

impl ResponseFilter for ExtensionFilter {
    fn matches(&self, response: &FetchedResponse) -> bool {
        let ext = extension(&response.url);
        self.extensions.iter().any(|candidate| *candidate == ext)
    }

    fn describe(&self) -> String {
        let names: Vec<&str> = self
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.'))
            .collect();
        format!("extension: {}", names.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthFilter {
    lengths: Vec<usize>,
}

impl LengthFilter {
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        Ok(Self {
            lengths: parse_numbers(input)?,
        })
    }
}

impl ResponseFilter for LengthFilter {
    fn matches(&self, response: &FetchedResponse) -> bool {
        self.lengths.contains(&response.body.len())
    }

    fn describe(&self) -> String {
        format!("length: {}", join(&self.lengths))
    }
}

// Every token must parse; one bad token fails the whole list
fn parse_numbers<T>(input: &str) -> Result<Vec<T>, FilterError>
where
    T: FromStr<Err = ParseIntError>,
{
    input
        .split(',')
        .map(str::trim)
        .map(|token| {
            token.parse().map_err(|source| FilterError::InvalidNumber {
                token: token.to_string(),
                source,
            })
        })
        .collect()
}

fn join<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

// The configured filters, in order
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn ResponseFilter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn ResponseFilter>>) -> Self {
        Self { filters }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    // true when any filter matches; later filters are not consulted
    pub fn suppresses(&self, response: &FetchedResponse) -> bool {
        match self.filters.iter().find(|filter| filter.matches(response)) {
            Some(filter) => {
                debug!("{} suppressed by {}", response.url, filter.describe());
                true
            }
            None => false,
        }
    }

    pub fn describe(&self) -> Vec<String> {
        self.filters.iter().map(|filter| filter.describe()).collect()
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.describe()).finish()
    }
}

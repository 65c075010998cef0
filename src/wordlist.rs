// src/wordlist.rs
// =============================================================================
// Reads the optional wordlist of seed paths.
//
// The whole file is loaded at start-up (so an unreadable file is a
// configuration error, not a crawl error) and then handed to the crawler as
// a cursor: advance() moves to the next entry, current() reads it.
// Blank lines are skipped.
// =============================================================================

use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Wordlist {
    entries: Vec<String>,
    // None = before the first entry
    position: Option<usize>,
}

impl Wordlist {
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_lines(content.lines()))
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let entries = lines
            .into_iter()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            entries,
            position: None,
        }
    }

    // Moves to the next entry. Returns false once the list is exhausted.
    pub fn advance(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.entries.len()));
        next < self.entries.len()
    }

    // The entry under the cursor, if the cursor is on one
    pub fn current(&self) -> Option<&str> {
        self.position
            .and_then(|p| self.entries.get(p))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_walks_entries_in_order() {
        let mut wordlist = Wordlist::from_lines(["admin", "", "  backup.zip  ", "api/v1"]);
        assert_eq!(wordlist.len(), 3);
        assert_eq!(wordlist.current(), None);

        let mut seen = Vec::new();
        while wordlist.advance() {
            seen.push(wordlist.current().unwrap().to_string());
        }
        assert_eq!(seen, vec!["admin", "backup.zip", "api/v1"]);

        // Exhausted cursors stay exhausted
        assert!(!wordlist.advance());
        assert_eq!(wordlist.current(), None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Wordlist::from_file(Path::new("/definitely/not/here.txt")).is_err());
    }
}

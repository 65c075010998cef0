// src/crawl/state.rs
// =============================================================================
// Discovery state shared by every visit task of one crawl.
//
// - visit keys: every URL (or "METHOD URL") ever dispatched or completed
// - lengths:    body sizes already seen, a cheap duplicate-page detector
// - counters:   errors and emitted records
//
// Both sets live behind one mutex and every check-then-insert happens inside
// a single lock, so two tasks discovering the same link at the same moment
// cannot both dispatch it. The sets only grow.
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
struct SeenSets {
    keys: HashSet<String>,
    lengths: HashSet<usize>,
}

#[derive(Debug)]
pub struct CrawlState {
    seen: Mutex<SeenSets>,
    errors: AtomicU64,
    emitted: AtomicU64,
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlState {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(SeenSets {
                keys: HashSet::new(),
                // Empty bodies never count as a new page
                lengths: HashSet::from([0]),
            }),
            errors: AtomicU64::new(0),
            emitted: AtomicU64::new(0),
        }
    }

    // Claims `key` for this crawl. Returns true only for the first caller.
    pub fn claim(&self, key: &str) -> bool {
        let mut seen = self.seen.lock();
        !seen.keys.contains(key) && seen.keys.insert(key.to_string())
    }

    // Records a URL reached through redirects so it is not fetched again
    pub fn mark_visited(&self, key: &str) {
        self.seen.lock().keys.insert(key.to_string());
    }

    // True the first time a body of this length is seen.
    //
    // TODO: key on a content hash instead of the length; two different
    // pages of equal size are currently treated as one.
    pub fn first_of_length(&self, length: usize) -> bool {
        self.seen.lock().lengths.insert(length)
    }

    // Increments the error counter, returning the new total
    pub fn record_error(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn visited_count(&self) -> usize {
        self.seen.lock().keys.len()
    }
}

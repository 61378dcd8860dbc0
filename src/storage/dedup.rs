//! In-memory deduplication across a whole crawl
//!
//! Records are identified by (name, address, body prefix). The first
//! occurrence wins and encounter order is preserved; the seen-set lives as
//! long as one crawl.

use std::collections::HashSet;

use crate::models::{CrawlRecord, DedupKey};

/// Deduplicator keyed on [`DedupKey`]
#[derive(Debug)]
pub struct Deduplicator {
    seen: HashSet<DedupKey>,
    prefix_chars: usize,
    duplicates: usize,
}

impl Deduplicator {
    /// Create a deduplicator comparing the first `prefix_chars` body characters
    pub fn new(prefix_chars: usize) -> Self {
        Self {
            seen: HashSet::new(),
            prefix_chars,
            duplicates: 0,
        }
    }

    /// Register a record; returns `false` when its key was already seen
    pub fn insert<R: CrawlRecord>(&mut self, record: &R) -> bool {
        let fresh = self.seen.insert(record.dedup_key(self.prefix_chars));
        if !fresh {
            self.duplicates += 1;
        }
        fresh
    }

    /// Keep only records not seen before, in their original order
    pub fn retain_new<R: CrawlRecord>(&mut self, records: Vec<R>) -> Vec<R> {
        records.into_iter().filter(|r| self.insert(r)).collect()
    }

    /// Number of distinct keys seen
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing was registered yet
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Number of dropped duplicates
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(80)
    }
}

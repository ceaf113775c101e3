//! Deduplication of search candidates across providers.
//!
//! Candidates that share an identifier collapse into one merged entry;
//! everything else is kept under a synthetic key. An entry is indexed under
//! every ISBN it carries, in both the ISBN-10 and ISBN-13 forms. Entries keep the slot of
//! their first insertion, so output order is stable.

use std::collections::HashMap;

use crate::merge::merge;
use crate::models::{BookRecord, Candidate};

/// Provenance given to entries built from more than one candidate
pub const COMBINED_SOURCE: &str = "Combined";

/// How a candidate ended up in the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// New entry
    Added,
    /// Merged into an entry with the same identifier
    Combined,
    /// Skipped because the identifier is already present
    Skipped,
}

/// Insertion-ordered map of candidates keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct CandidateMap {
    entries: Vec<BookRecord>,
    index: HashMap<String, usize>,
    next_synthetic: usize,
}

impl CandidateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a search candidate.
    ///
    /// A candidate whose identifier is already present is merged into the
    /// existing entry (existing values win) and marked [`COMBINED_SOURCE`].
    pub fn insert(&mut self, candidate: Candidate) -> Insertion {
        let keys = candidate.identifiers();
        if !keys.is_empty() {
            if let Some(slot) = self.find(&keys) {
                let mut combined = merge(&self.entries[slot], &candidate.record);
                combined.source = Some(COMBINED_SOURCE.to_string());
                let combined_keys = combined.identifier_keys();
                self.entries[slot] = combined;
                self.index_keys(combined_keys, slot);
                return Insertion::Combined;
            }
            self.push(keys, candidate.record);
            return Insertion::Added;
        }

        let key = match candidate.source_id {
            Some(source_id) if !self.index.contains_key(&source_id) => source_id,
            _ => self.synthetic_key(),
        };
        self.push(vec![key], candidate.record);
        Insertion::Added
    }

    /// Add an edition unless one of its identifiers is already present.
    ///
    /// Never touches an existing entry.
    pub fn insert_edition(&mut self, edition: BookRecord) -> Insertion {
        let keys = edition.identifier_keys();
        if self.find(&keys).is_some() {
            return Insertion::Skipped;
        }
        let keys = if keys.is_empty() {
            vec![self.synthetic_key()]
        } else {
            keys
        };
        self.push(keys, edition);
        Insertion::Added
    }

    /// Whether an entry is keyed by `identifier` (either ISBN form)
    pub fn contains_identifier(&self, identifier: &str) -> bool {
        let lookup = BookRecord {
            isbn13: (identifier.len() == 13).then(|| identifier.to_string()),
            isbn10: (identifier.len() == 10).then(|| identifier.to_string()),
            ..Default::default()
        };
        self.find(&lookup.identifier_keys()).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in insertion order, at most `limit`
    pub fn into_records(self, limit: usize) -> Vec<BookRecord> {
        let mut entries = self.entries;
        entries.truncate(limit);
        entries
    }

    fn find(&self, keys: &[String]) -> Option<usize> {
        keys.iter().find_map(|key| self.index.get(key).copied())
    }

    fn push(&mut self, keys: Vec<String>, record: BookRecord) {
        let slot = self.entries.len();
        self.entries.push(record);
        self.index_keys(keys, slot);
    }

    /// Point every unclaimed key at `slot`
    fn index_keys(&mut self, keys: Vec<String>, slot: usize) {
        for key in keys {
            self.index.entry(key).or_insert(slot);
        }
    }

    fn synthetic_key(&mut self) -> String {
        loop {
            self.next_synthetic += 1;
            let key = format!("synthetic:{}", self.next_synthetic);
            if !self.index.contains_key(&key) {
                return key;
            }
        }
    }
}

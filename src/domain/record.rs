// ============================================================
// Layer 3 — Record Domain Types
// ============================================================
// A record is a single title keyed by a dense integer.
// Keys are assigned when a batch is adapted and carry no meaning
// beyond their batch: the same title can get a different key on
// the next run.
//
// The record payload serialises as `{"title": "..."}` so labeled
// pairs written to disk stay readable and independent of keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dense integer key of a record within one batch.
pub type RecordKey = usize;

/// The attributes of one record. The gazetteer only looks at `title`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TitleRecord {
    pub title: String,
}

impl TitleRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

/// A keyed record collection. BTreeMap keeps iteration in key order,
/// which is also the original input order.
pub type Records = BTreeMap<RecordKey, TitleRecord>;

/// Assign dense keys 0..n-1 to titles in iteration order.
pub fn records_from_titles<I, S>(titles: I) -> Records
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    titles
        .into_iter()
        .enumerate()
        .map(|(key, title)| (key, TitleRecord::new(title)))
        .collect()
}

/// One messy record paired with one canonical record.
/// This is the unit the active-learning loop asks a human about.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPair {
    pub messy_key:     RecordKey,
    pub messy:         TitleRecord,
    pub canonical_key: RecordKey,
    pub canonical:     TitleRecord,
}

impl RecordPair {
    /// The key-free form stored in training pairs.
    pub fn to_labeled(&self) -> (TitleRecord, TitleRecord) {
        (self.messy.clone(), self.canonical.clone())
    }
}

/// One ranked candidate returned by a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    /// Key of the canonical record
    pub key:   RecordKey,
    /// Match confidence in [0, 1]
    pub score: f64,
}

/// Query record key → candidates, best first, at most top-k long.
pub type SearchResult = BTreeMap<RecordKey, Vec<ScoredCandidate>>;

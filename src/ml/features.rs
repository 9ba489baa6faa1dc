// ============================================================
// Layer 5 — Field Comparators
// ============================================================
// Turns a (messy, canonical) title pair into a feature vector,
// one entry per field definition on `title`:
//
//   Exact  — 1.0 when the titles are identical, else 0.0
//   String — Jaro-Winkler similarity of the two strings
//   Text   — cosine similarity of TF-IDF token vectors, with IDF
//            fitted on every messy and canonical title
//
// Every feature lies in [0, 1].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Exact,
    String,
    Text,
}

/// Which attribute to compare and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field:      String,
    pub comparator: Comparator,
}

impl FieldDefinition {
    pub fn new(field: impl Into<String>, comparator: Comparator) -> Self {
        Self { field: field.into(), comparator }
    }
}

/// The three comparators the gazetteer applies to `title`.
pub fn title_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("title", Comparator::Exact),
        FieldDefinition::new("title", Comparator::String),
        FieldDefinition::new("title", Comparator::Text),
    ]
}

/// Sparse, L2-normalised TF-IDF vector.
pub type TermVector = BTreeMap<String, f64>;

// ─── TF-IDF ───────────────────────────────────────────────────────────────────
/// Smoothed inverse document frequencies over a title corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdf {
    documents:          usize,
    document_frequency: BTreeMap<String, usize>,
}

impl TfIdf {
    pub fn fit<'a, I>(corpus: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut documents = 0usize;
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();

        for text in corpus {
            documents += 1;
            let terms: BTreeSet<&str> = text.split_whitespace().collect();
            for term in terms {
                *document_frequency.entry(term.to_string()).or_insert(0) += 1;
            }
        }

        Self { documents, document_frequency }
    }

    /// ln((1 + N) / (1 + df)) + 1, so unseen terms still get weight.
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.document_frequency.get(term).copied().unwrap_or(0);
        ((1.0 + self.documents as f64) / (1.0 + df as f64)).ln() + 1.0
    }

    pub fn vector(&self, text: &str) -> TermVector {
        let mut tf: TermVector = BTreeMap::new();
        for term in text.split_whitespace() {
            *tf.entry(term.to_string()).or_insert(0.0) += 1.0;
        }
        for (term, weight) in tf.iter_mut() {
            *weight *= self.idf(term);
        }

        let norm = tf.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in tf.values_mut() {
                *weight /= norm;
            }
        }
        tf
    }

    pub fn prepare(&self, title: &str) -> PreparedTitle {
        PreparedTitle {
            title:  title.to_string(),
            vector: self.vector(title),
        }
    }
}

/// Cosine similarity of two normalised vectors.
pub fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, wa)| large.get(term).map(|wb| wa * wb))
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// A title with its TF-IDF vector computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTitle {
    pub title:  String,
    pub vector: TermVector,
}

// ─── Feature extraction ───────────────────────────────────────────────────────
/// One feature per field definition, in field order.
pub fn compare(fields: &[FieldDefinition], a: &PreparedTitle, b: &PreparedTitle) -> Vec<f64> {
    fields
        .iter()
        .map(|f| match f.comparator {
            Comparator::Exact  => if a.title == b.title { 1.0 } else { 0.0 },
            Comparator::String => strsim::jaro_winkler(&a.title, &b.title),
            Comparator::Text   => cosine(&a.vector, &b.vector),
        })
        .collect()
}

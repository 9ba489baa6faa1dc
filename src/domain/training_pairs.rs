// ============================================================
// Layer 3 — Training Pairs
// ============================================================
// The labels a human has given so far for one category.
//
// On disk this is the dedupe-style layout:
//   {
//     "match":    [[{"title": "cmo"}, {"title": "chief marketing officer"}], ...],
//     "distinct": [[{"title": "hr"},  {"title": "chief marketing officer"}], ...]
//   }
//
// Pairs are stored by value, never by record key, because keys are
// re-assigned on every run. A pair lives in at most one of the two
// partitions: relabeling moves it.

use serde::{Deserialize, Serialize};

use crate::domain::record::TitleRecord;

/// A key-free (messy, canonical) pair.
pub type LabeledPair = (TitleRecord, TitleRecord);

/// The two labels that end up in training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Match,
    Distinct,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingPairs {
    #[serde(rename = "match", default)]
    pub matches: Vec<LabeledPair>,

    #[serde(default)]
    pub distinct: Vec<LabeledPair>,
}

impl TrainingPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a label, replacing any earlier label for the same pair.
    pub fn add(&mut self, pair: LabeledPair, label: Label) {
        self.matches.retain(|p| p != &pair);
        self.distinct.retain(|p| p != &pair);
        match label {
            Label::Match    => self.matches.push(pair),
            Label::Distinct => self.distinct.push(pair),
        }
    }

    /// The label recorded for a (messy, canonical) pair, if any.
    pub fn label_of(&self, messy: &TitleRecord, canonical: &TitleRecord) -> Option<Label> {
        let hit = |p: &LabeledPair| &p.0 == messy && &p.1 == canonical;
        if self.matches.iter().any(hit) {
            Some(Label::Match)
        } else if self.distinct.iter().any(hit) {
            Some(Label::Distinct)
        } else {
            None
        }
    }

    /// Iterate every labeled pair together with its label.
    pub fn iter(&self) -> impl Iterator<Item = (&LabeledPair, Label)> {
        self.matches
            .iter()
            .map(|p| (p, Label::Match))
            .chain(self.distinct.iter().map(|p| (p, Label::Distinct)))
    }

    pub fn len(&self) -> usize {
        self.matches.len() + self.distinct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> LabelCounts {
        LabelCounts {
            matches:  self.matches.len(),
            distinct: self.distinct.len(),
        }
    }
}

/// Match / distinct totals, as reported after a training session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelCounts {
    pub matches:  usize,
    pub distinct: usize,
}

impl LabelCounts {
    pub fn total(&self) -> usize {
        self.matches + self.distinct
    }
}

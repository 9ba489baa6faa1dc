// ============================================================
// Layer 3 — Core Traits (Ports)
// ============================================================
// The orchestrators only ever talk to these two traits:
//
//   MatchingEngine — everything statistical: blocking, active pair
//                    selection, classifier training, the canonical
//                    index and ranked search
//   Labeler        — whoever answers "are these the same title?":
//                    a human at the console, a replay of recorded
//                    labels, or a scripted test harness
//
// Any engine that honours this surface can replace the bundled
// GazetteerEngine without touching the application layer.

use std::io;

use crate::domain::record::{RecordPair, Records, SearchResult};
use crate::domain::training_pairs::{Label, TrainingPairs};

// ─── MatchingEngine ───────────────────────────────────────────────────────────
/// Capability surface of a trainable gazetteer.
pub trait MatchingEngine {
    /// Mutable state of one active-learning session
    type Session;
    /// The trained, serialisable matcher
    type Model;
    /// A searchable index over canonical records
    type Index;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sample candidate pairs and fold in previously recorded labels.
    fn prepare_training(
        &self,
        messy:     &Records,
        canonical: &Records,
        prior:     Option<&TrainingPairs>,
    ) -> Result<Self::Session, Self::Error>;

    /// The pair the engine is least certain about, or None when none remain.
    fn next_uncertain_pair(&self, session: &mut Self::Session) -> Option<RecordPair>;

    /// Feed one human label back into the session.
    fn record_label(&self, session: &mut Self::Session, pair: &RecordPair, label: Label);

    /// Every label the session holds, prior labels included.
    fn training_pairs(&self, session: &Self::Session) -> TrainingPairs;

    fn train(&self, session: &Self::Session) -> Result<Self::Model, Self::Error>;

    fn serialize(&self, model: &Self::Model) -> Result<Vec<u8>, Self::Error>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Model, Self::Error>;

    fn build_index(&self, model: &Self::Model, canonical: &Records) -> Result<Self::Index, Self::Error>;

    /// Up to `top_k` canonical candidates per query, best first, scores in [0, 1].
    fn search(
        &self,
        index:   &Self::Index,
        queries: &Records,
        top_k:   usize,
    ) -> Result<SearchResult, Self::Error>;
}

// ─── Labeler ──────────────────────────────────────────────────────────────────
/// What a labeler answered for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelDecision {
    Match,
    Distinct,
    /// Skip this pair without recording a label
    Uncertain,
    /// Stop labeling and go on to training
    Finished,
    /// Abort the whole session without persisting anything
    Cancel,
}

/// Running tallies shown to whoever is labeling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelProgress {
    pub matches:   usize,
    pub distinct:  usize,
    pub uncertain: usize,
}

/// Anything that can answer one labeling question at a time.
pub trait Labeler {
    fn label(&mut self, pair: &RecordPair, progress: &LabelProgress) -> io::Result<LabelDecision>;
}

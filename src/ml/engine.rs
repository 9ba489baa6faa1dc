// ============================================================
// Layer 5 — GazetteerEngine
// ============================================================
// The bundled implementation of the MatchingEngine port. It glues
// the pieces of this layer together:
//
//   prepare_training    → ActiveLearningSession::new
//   next_uncertain_pair → least-certain unasked pool pair
//   record_label        → store label, refit classifier
//   train               → final fit + blocking predicates
//   serialize           → bincode(VersionedModel)
//   build_index/search  → CanonicalIndex

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::record::{RecordPair, Records, SearchResult};
use crate::domain::traits::MatchingEngine;
use crate::domain::training_pairs::{Label, TrainingPairs};
use crate::ml::active_learning::ActiveLearningSession;
use crate::ml::features::{title_fields, FieldDefinition};
use crate::ml::index::CanonicalIndex;
use crate::ml::model::{GazetteerModel, VersionedModel, MODEL_VERSION};
use crate::ml::trainer::TrainerConfig;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no canonical records to match against")]
    EmptyCanonical,

    #[error("training needs at least one labeled pair (have {matches} match, {distinct} distinct)")]
    InsufficientLabels { matches: usize, distinct: usize },

    #[error("model was written with layout version {found}, this build reads version {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("model serialisation failed: {0}")]
    Serialization(#[from] bincode::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Size of the active-learning candidate pool
    pub sample_size:        usize,
    /// Share of the pool drawn from blocked pairs
    pub blocked_proportion: f64,
    /// Seed for pool sampling
    pub seed:               u64,
    /// Minimum score a search candidate must reach
    pub threshold:          f64,
    /// Gradient-descent settings for every classifier fit
    pub trainer:            TrainerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_size:        1_500,
            blocked_proportion: 0.5,
            seed:               42,
            threshold:          0.0,
            trainer:            TrainerConfig::default(),
        }
    }
}

pub struct GazetteerEngine {
    fields: Vec<FieldDefinition>,
    config: EngineConfig,
}

impl GazetteerEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { fields: title_fields(), config }
    }
}

impl Default for GazetteerEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl MatchingEngine for GazetteerEngine {
    type Session = ActiveLearningSession;
    type Model   = GazetteerModel;
    type Index   = CanonicalIndex;
    type Error   = EngineError;

    fn prepare_training(
        &self,
        messy:     &Records,
        canonical: &Records,
        prior:     Option<&TrainingPairs>,
    ) -> Result<Self::Session, Self::Error> {
        ActiveLearningSession::new(self.fields.clone(), self.config.clone(), messy, canonical, prior)
    }

    fn next_uncertain_pair(&self, session: &mut Self::Session) -> Option<RecordPair> {
        session.next_uncertain_pair()
    }

    fn record_label(&self, session: &mut Self::Session, pair: &RecordPair, label: Label) {
        session.record_label(pair, label);
    }

    fn training_pairs(&self, session: &Self::Session) -> TrainingPairs {
        session.labels().clone()
    }

    fn train(&self, session: &Self::Session) -> Result<Self::Model, Self::Error> {
        session.train()
    }

    fn serialize(&self, model: &Self::Model) -> Result<Vec<u8>, Self::Error> {
        let versioned = VersionedModel { version: MODEL_VERSION, model: model.clone() };
        Ok(bincode::serialize(&versioned)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Model, Self::Error> {
        let versioned: VersionedModel = bincode::deserialize(bytes)?;
        if versioned.version != MODEL_VERSION {
            return Err(EngineError::UnsupportedVersion {
                found:    versioned.version,
                expected: MODEL_VERSION,
            });
        }
        Ok(versioned.model)
    }

    fn build_index(&self, model: &Self::Model, canonical: &Records) -> Result<Self::Index, Self::Error> {
        if canonical.is_empty() {
            return Err(EngineError::EmptyCanonical);
        }
        Ok(CanonicalIndex::build(model, canonical))
    }

    fn search(
        &self,
        index:   &Self::Index,
        queries: &Records,
        top_k:   usize,
    ) -> Result<SearchResult, Self::Error> {
        Ok(queries
            .iter()
            .map(|(key, record)| (*key, index.search(&record.title, top_k, self.config.threshold)))
            .collect())
    }
}

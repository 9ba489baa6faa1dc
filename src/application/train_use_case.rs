// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Runs one training session for one category through its states:
//
//   Init      → Preparing : load messy titles (Layer 4 - data),
//                           canonical titles (Layer 4 - data) and
//                           prior training pairs (Layer 6 - infra)
//   Preparing → Labeling  : engine.prepare_training  (Layer 5 - ml)
//   Labeling  → Trained   : ask the labeler pair by pair, then
//                           engine.train + serialize (Layer 5 - ml)
//   Trained   → Persisted : save training pairs, then settings
//                           (Layer 6 - infra)
//   Persisted → Indexed   : engine.build_index       (Layer 5 - ml)
//
// Nothing touches the artifact store before Trained. A failure or a
// cancel before that point drops the whole session back to Init.
// Once Trained, a failed persist keeps the session in Trained and
// remembers which artifacts already made it to disk, so calling
// persist() again only writes what is still missing.
//
// Within one persist() call, failed attempts are retried after a
// pause that starts at `persist_backoff_ms` and doubles each time:
//
//   attempt 1 ✗ → wait 100ms → attempt 2 ✗ → wait 200ms → attempt 3
//
// Reference: Rust Book §9 (Recoverable Errors with Result)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::context::{PathsConfig, SessionContext};
use crate::data::{
    adapter::RecordAdapter,
    loader::read_messy_titles,
    normalizer::{Normalizer, DEFAULT_MAX_TITLE_LEN},
    taxonomy::CategoryTaxonomy,
};
use crate::domain::{
    error::GazetteerError,
    record::{Records, SearchResult},
    state::TrainingState,
    traits::{LabelDecision, LabelProgress, Labeler, MatchingEngine},
    training_pairs::{Label, LabelCounts, TrainingPairs},
};
use crate::infra::artifact_store::{ArtifactStore, LearnedSettings};
use crate::ml::engine::EngineConfig;

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Where inputs are read and artifacts and logs are written
    pub paths:              PathsConfig,
    /// Titles longer than this (in characters) are dropped before matching
    pub max_title_len:      usize,
    /// Pool sampling, search threshold and classifier settings
    pub engine:             EngineConfig,
    /// How many times one persist() call tries to write the artifacts
    pub persist_attempts:   usize,
    /// Pause before the first retry; doubled for each later retry
    pub persist_backoff_ms: u64,
    /// Answer labeling questions from this training file instead of the console
    pub replay:             Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            paths:              PathsConfig::default(),
            max_title_len:      DEFAULT_MAX_TITLE_LEN,
            engine:             EngineConfig::default(),
            persist_attempts:   3,
            persist_backoff_ms: 100,
            replay:             None,
        }
    }
}

/// What a finished session reports back to the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSummary {
    /// Label totals read back from the stored training file
    pub labels:   LabelCounts,
    /// Answers given during this session only
    pub session:  LabelProgress,
    pub indexed:  usize,
}

/// The trained model plus what still has to reach the store.
struct TrainedArtifacts<M> {
    model:          M,
    pairs:          TrainingPairs,
    settings:       LearnedSettings,
    pairs_saved:    bool,
    settings_saved: bool,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase<E: MatchingEngine> {
    ctx:       SessionContext,
    taxonomy:  CategoryTaxonomy,
    config:    TrainConfig,
    engine:    E,
    store:     ArtifactStore,
    state:     TrainingState,
    messy:     Records,
    canonical: Records,
    prior:     Option<TrainingPairs>,
    session:   Option<E::Session>,
    trained:   Option<TrainedArtifacts<E::Model>>,
    index:     Option<E::Index>,
    progress:  LabelProgress,
}

impl<E: MatchingEngine> TrainUseCase<E> {
    pub fn new(ctx: SessionContext, taxonomy: CategoryTaxonomy, config: TrainConfig, engine: E) -> Self {
        let store = ctx.store();
        Self {
            ctx,
            taxonomy,
            config,
            engine,
            store,
            state:     TrainingState::Init,
            messy:     Records::new(),
            canonical: Records::new(),
            prior:     None,
            session:   None,
            trained:   None,
            index:     None,
            progress:  LabelProgress::default(),
        }
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn progress(&self) -> LabelProgress {
        self.progress
    }

    /// Run every step from Init to Indexed.
    pub fn execute(&mut self, labeler: &mut dyn Labeler) -> Result<TrainingSummary, GazetteerError> {
        self.load_inputs()?;
        self.prepare()?;
        self.label_and_train(labeler)?;
        self.persist()?;
        self.build_index()?;
        self.summary()
    }

    // ── Init → Preparing ─────────────────────────────────────────────────────
    pub fn load_inputs(&mut self) -> Result<(), GazetteerError> {
        self.expect_state(TrainingState::Init)?;
        let result = self.read_inputs();
        self.discard_on_error(result)?;
        self.state = TrainingState::Preparing;
        Ok(())
    }

    fn read_inputs(&mut self) -> Result<(), GazetteerError> {
        let category = self.ctx.category.clone();
        let adapter  = RecordAdapter::new(Normalizer::new(self.config.max_title_len));

        tracing::info!("Loading messy data from '{}'", self.ctx.messy_file.display());
        let rows  = read_messy_titles(&self.ctx.messy_file, &category)?;
        let messy = adapter.adapt_messy(&rows);
        tracing::info!("Messy sample size: {}", messy.len());
        if let Some(record) = messy.values().next() {
            tracing::info!("Messy sample record: {:?}", record.title);
        }
        if messy.is_empty() {
            tracing::warn!("No messy title survived normalization");
        }

        let canonical = adapter.adapt_canonical(&self.taxonomy, &category)?;
        tracing::info!("Canonical sample size: {}", canonical.len());
        if let Some(record) = canonical.values().next() {
            tracing::info!("Canonical sample record: {:?}", record.title);
        }

        let prior = self.store.load_training(&category)?;
        match &prior {
            Some(pairs) => tracing::info!("Reading prior labeled pairs: {} found", pairs.len()),
            None        => tracing::info!("No prior training data for '{}'", category),
        }

        self.messy     = messy;
        self.canonical = canonical;
        self.prior     = prior;
        Ok(())
    }

    // ── Preparing → Labeling ─────────────────────────────────────────────────
    pub fn prepare(&mut self) -> Result<(), GazetteerError> {
        self.expect_state(TrainingState::Preparing)?;
        let result = self
            .engine
            .prepare_training(&self.messy, &self.canonical, self.prior.as_ref())
            .map_err(|e| self.engine_failure(&e));
        let session = self.discard_on_error(result)?;

        self.session = Some(session);
        self.state   = TrainingState::Labeling;
        Ok(())
    }

    // ── Labeling → Trained ───────────────────────────────────────────────────
    pub fn label_and_train(&mut self, labeler: &mut dyn Labeler) -> Result<(), GazetteerError> {
        self.expect_state(TrainingState::Labeling)?;
        let result = self.run_labeling(labeler).and_then(|()| self.train());
        self.discard_on_error(result)?;
        self.state = TrainingState::Trained;
        Ok(())
    }

    fn run_labeling(&mut self, labeler: &mut dyn Labeler) -> Result<(), GazetteerError> {
        let category = self.ctx.category.clone();
        let Some(mut session) = self.session.take() else {
            return Err(out_of_order(&category, TrainingState::Labeling, self.state));
        };

        tracing::info!("Starting active labeling...");
        loop {
            let Some(pair) = self.engine.next_uncertain_pair(&mut session) else {
                tracing::info!("No more candidate pairs to label");
                break;
            };

            let decision = labeler
                .label(&pair, &self.progress)
                .map_err(|e| GazetteerError::io(&category, "<labeler>", e))?;

            match decision {
                LabelDecision::Match => {
                    self.engine.record_label(&mut session, &pair, Label::Match);
                    self.progress.matches += 1;
                }
                LabelDecision::Distinct => {
                    self.engine.record_label(&mut session, &pair, Label::Distinct);
                    self.progress.distinct += 1;
                }
                LabelDecision::Uncertain => self.progress.uncertain += 1,
                LabelDecision::Finished  => {
                    tracing::info!("Finished labeling");
                    break;
                }
                LabelDecision::Cancel => {
                    tracing::info!("Labeling cancelled; discarding session");
                    return Err(GazetteerError::LabelingCancelled { category });
                }
            }
        }

        self.session = Some(session);
        Ok(())
    }

    fn train(&mut self) -> Result<(), GazetteerError> {
        let state    = self.state;
        let category = self.ctx.category.as_str();
        let Some(session) = self.session.as_ref() else {
            return Err(out_of_order(category, TrainingState::Labeling, state));
        };

        tracing::info!("Training...");
        let model    = self.engine.train(session).map_err(|e| self.engine_failure(&e))?;
        let bytes    = self.engine.serialize(&model).map_err(|e| self.engine_failure(&e))?;
        let pairs    = self.engine.training_pairs(session);

        self.trained = Some(TrainedArtifacts {
            model,
            pairs,
            settings:       LearnedSettings::new(bytes),
            pairs_saved:    false,
            settings_saved: false,
        });
        self.session = None;
        Ok(())
    }

    // ── Trained → Persisted ──────────────────────────────────────────────────
    /// Write training pairs, then learned settings, retrying with backoff.
    /// On failure the session stays in Trained and a later call resumes
    /// with the unsaved artifacts.
    pub fn persist(&mut self) -> Result<(), GazetteerError> {
        self.expect_state(TrainingState::Trained)?;
        let attempts = self.config.persist_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.try_persist() {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    let pause = self.backoff(attempt);
                    tracing::warn!(
                        "Persist attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        pause
                    );
                    std::thread::sleep(pause);
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Persisting failed after {} attempts: {}", attempts, e);
                    return Err(e);
                }
            }
        }

        self.state = TrainingState::Persisted;
        Ok(())
    }

    /// Pause after failed attempt `attempt` (1-based).
    fn backoff(&self, attempt: usize) -> Duration {
        let factor = 1u64 << (attempt - 1).min(16);
        Duration::from_millis(self.config.persist_backoff_ms.saturating_mul(factor))
    }

    fn try_persist(&mut self) -> Result<(), GazetteerError> {
        let category = self.ctx.category.as_str();
        let store    = &self.store;
        let Some(trained) = self.trained.as_mut() else {
            return Err(out_of_order(category, TrainingState::Trained, self.state));
        };

        if !trained.pairs_saved {
            tracing::info!("Writing training pairs...");
            store.save_training(category, &trained.pairs)?;
            trained.pairs_saved = true;
        }
        if !trained.settings_saved {
            tracing::info!("Writing learned settings...");
            store.save_settings(category, &trained.settings)?;
            trained.settings_saved = true;
        }
        Ok(())
    }

    // ── Persisted → Indexed ──────────────────────────────────────────────────
    pub fn build_index(&mut self) -> Result<(), GazetteerError> {
        self.expect_state(TrainingState::Persisted)?;
        let Some(trained) = self.trained.as_ref() else {
            return Err(out_of_order(&self.ctx.category, TrainingState::Persisted, self.state));
        };

        let index = self
            .engine
            .build_index(&trained.model, &self.canonical)
            .map_err(|e| self.engine_failure(&e))?;
        tracing::info!("Indexed {} canonical records", self.canonical.len());

        self.index = Some(index);
        self.state = TrainingState::Indexed;
        Ok(())
    }

    /// Search the freshly built index; only valid once Indexed.
    pub fn search(&self, queries: &Records, top_k: usize) -> Result<SearchResult, GazetteerError> {
        let Some(index) = self.index.as_ref() else {
            return Err(out_of_order(&self.ctx.category, TrainingState::Indexed, self.state));
        };
        self.engine.search(index, queries, top_k).map_err(|e| self.engine_failure(&e))
    }

    fn summary(&self) -> Result<TrainingSummary, GazetteerError> {
        let labels = self.store.label_counts(&self.ctx.category)?.unwrap_or_default();
        tracing::info!("Number of matches: {}", labels.matches);
        tracing::info!("Number of distinct: {}", labels.distinct);
        tracing::info!("Total labeled pairs: {}", labels.total());

        Ok(TrainingSummary {
            labels,
            session: self.progress,
            indexed: self.canonical.len(),
        })
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    fn expect_state(&self, expected: TrainingState) -> Result<(), GazetteerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(out_of_order(&self.ctx.category, expected, self.state))
        }
    }

    fn engine_failure(&self, err: &E::Error) -> GazetteerError {
        GazetteerError::EngineFailure {
            category: self.ctx.category.clone(),
            stage:    self.state.to_string(),
            reason:   err.to_string(),
        }
    }

    /// Before Trained, any error throws the whole session away.
    fn discard_on_error<T>(&mut self, result: Result<T, GazetteerError>) -> Result<T, GazetteerError> {
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn reset(&mut self) {
        self.state     = TrainingState::Init;
        self.messy     = Records::new();
        self.canonical = Records::new();
        self.prior     = None;
        self.session   = None;
        self.trained   = None;
        self.index     = None;
        self.progress  = LabelProgress::default();
    }
}

fn out_of_order(category: &str, expected: TrainingState, actual: TrainingState) -> GazetteerError {
    GazetteerError::OutOfOrder { category: category.to_string(), expected, actual }
}

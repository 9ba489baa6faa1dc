// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores the held-out test samples of one category against the
// gazetteer a previous `train` left behind:
//
//   Step 1: Load learned settings        (Layer 6 - infra)
//   Step 2: Rebuild the trained model    (Layer 5 - ml)
//   Step 3: Canonical records            (Layer 4 - data)
//   Step 4: Build the canonical index    (Layer 5 - ml)
//   Step 5: Load + adapt the test set    (Layer 4 - data)
//   Step 6: Top-k search per entity      (Layer 5 - ml)
//
// Evaluation only ever reads from the artifact store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::application::context::{PathsConfig, SessionContext};
use crate::data::{adapter::RecordAdapter, loader::read_test_file, taxonomy::CategoryTaxonomy};
use crate::domain::{error::GazetteerError, record::RecordKey, traits::MatchingEngine};
use crate::infra::{artifact_store::ArtifactStore, metrics::EvaluationMetrics};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateConfig {
    /// Where the taxonomy, test set, artifacts and logs live
    pub paths:     PathsConfig,
    /// Candidates reported per test sample
    pub top_k:     usize,
    /// Minimum score a candidate must reach to be reported
    pub threshold: f64,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            paths:     PathsConfig::default(),
            top_k:     3,
            threshold: 0.0,
        }
    }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    /// Normalized canonical title
    pub title: String,
    /// Match confidence in [0, 1]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRanking {
    /// The test sample as normalized before searching
    pub sample:     String,
    /// Best first, at most `top_k`
    pub candidates: Vec<RankedCandidate>,
}

/// entity name → sample key → ranked canonical titles
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub category: String,
    pub entities: BTreeMap<String, BTreeMap<RecordKey, SampleRanking>>,
    pub metrics:  EvaluationMetrics,
}

// ─── EvaluateUseCase ─────────────────────────────────────────────────────────

pub struct EvaluateUseCase<E: MatchingEngine> {
    ctx:      SessionContext,
    taxonomy: CategoryTaxonomy,
    config:   EvaluateConfig,
    engine:   E,
    store:    ArtifactStore,
    adapter:  RecordAdapter,
}

impl<E: MatchingEngine> EvaluateUseCase<E> {
    pub fn new(ctx: SessionContext, taxonomy: CategoryTaxonomy, config: EvaluateConfig, engine: E) -> Self {
        let store = ctx.store();
        Self { ctx, taxonomy, config, engine, store, adapter: RecordAdapter::default() }
    }

    pub fn execute(&self) -> Result<EvaluationReport, GazetteerError> {
        let category = self.ctx.category.as_str();

        // ── Step 1 + 2: learned settings → model ─────────────────────────────
        let settings = self.store.load_settings(category)?;
        let model = self.engine.deserialize(settings.as_bytes()).map_err(|e| {
            match self.store.settings_path(category) {
                Ok(path) => GazetteerError::ArtifactCorrupt {
                    category: category.to_string(),
                    path,
                    reason: e.to_string(),
                },
                Err(err) => err,
            }
        })?;
        tracing::info!("Loaded learned settings for '{}'", category);

        // ── Step 3 + 4: canonical index ──────────────────────────────────────
        let canonical = self.adapter.adapt_canonical(&self.taxonomy, category)?;
        let index = self
            .engine
            .build_index(&model, &canonical)
            .map_err(|e| self.engine_failure("indexing", &e))?;
        tracing::info!("Indexed {} canonical records", canonical.len());

        // ── Step 5: test set ─────────────────────────────────────────────────
        tracing::info!("Reading test samples from '{}'", self.ctx.test_file.display());
        let raw      = read_test_file(&self.ctx.test_file, category)?;
        let test_set = self.adapter.adapt_test_set(&raw, category)?;

        // ── Step 6: search ───────────────────────────────────────────────────
        let mut metrics  = EvaluationMetrics { entities: test_set.len(), ..EvaluationMetrics::default() };
        let mut entities = BTreeMap::new();

        for (entity, samples) in &test_set {
            let result = self
                .engine
                .search(&index, samples, self.config.top_k)
                .map_err(|e| self.engine_failure("searching", &e))?;

            let mut rankings = BTreeMap::new();
            for (key, found) in result {
                let candidates: Vec<RankedCandidate> = found
                    .iter()
                    .filter_map(|c| {
                        canonical.get(&c.key).map(|r| RankedCandidate { title: r.title.clone(), score: c.score })
                    })
                    .collect();

                let titles: Vec<&str> = candidates.iter().map(|c| c.title.as_str()).collect();
                metrics.record(entity, &titles);

                let sample = samples.get(&key).map(|r| r.title.clone()).unwrap_or_default();
                rankings.insert(key, SampleRanking { sample, candidates });
            }
            entities.insert(entity.clone(), rankings);
        }

        tracing::info!(
            "Evaluated {} samples over {} entities: top-1 {:.2}%, top-{} {:.2}%",
            metrics.samples,
            metrics.entities,
            100.0 * metrics.top1_rate(),
            self.config.top_k,
            100.0 * metrics.topk_rate()
        );

        Ok(EvaluationReport { category: category.to_string(), entities, metrics })
    }

    fn engine_failure(&self, stage: &str, err: &E::Error) -> GazetteerError {
        GazetteerError::EngineFailure {
            category: self.ctx.category.clone(),
            stage:    stage.to_string(),
            reason:   err.to_string(),
        }
    }
}

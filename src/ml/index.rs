// ============================================================
// Layer 5 — Canonical Index
// ============================================================
// In-memory search structure over one category's canonical
// records. Built at the start of every process from the learned
// model and never written to disk.
//
// A search:
//   1. collects canonical records sharing a learned blocking key
//      with the query (every record when none does)
//   2. scores each candidate with the classifier
//   3. drops scores below the threshold
//   4. sorts by score, best first, ties by canonical key
//   5. keeps the first top_k

use crate::domain::record::{RecordKey, Records, ScoredCandidate};
use crate::ml::blocking::BlockIndex;
use crate::ml::features::PreparedTitle;
use crate::ml::model::GazetteerModel;

pub struct CanonicalIndex {
    model:   GazetteerModel,
    records: Vec<(RecordKey, PreparedTitle)>,
    blocks:  BlockIndex,
}

impl CanonicalIndex {
    pub fn build(model: &GazetteerModel, canonical: &Records) -> Self {
        let records: Vec<(RecordKey, PreparedTitle)> = canonical
            .iter()
            .map(|(key, r)| (*key, model.prepare(&r.title)))
            .collect();
        let blocks = BlockIndex::build(
            &model.predicates,
            records.iter().map(|(_, p)| p.title.as_str()),
        );

        tracing::debug!("Indexed {} canonical records", records.len());
        Self { model: model.clone(), records, blocks }
    }

    pub fn search(&self, query: &str, top_k: usize, threshold: f64) -> Vec<ScoredCandidate> {
        let query = self.model.prepare(query);

        let mut positions = self.blocks.candidates(&self.model.predicates, &query.title);
        if positions.is_empty() {
            positions = (0..self.records.len()).collect();
        }

        let mut scored: Vec<ScoredCandidate> = positions
            .into_iter()
            .map(|pos| {
                let (key, canon) = &self.records[pos];
                ScoredCandidate { key: *key, score: self.model.score(&query, canon) }
            })
            .filter(|c| c.score >= threshold)
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.key.cmp(&b.key)));
        scored.truncate(top_k);
        scored
    }
}

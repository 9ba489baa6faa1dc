// ============================================================
// Layer 5 — Active Learning Session
// ============================================================
// Holds one labeling session's state:
//
//   1. A candidate pool of messy × canonical pairs. A share of
//      `blocked_proportion` comes from pairs that share a blocking
//      key; the rest are drawn at random so the classifier also
//      sees obvious non-matches.
//   2. The labels gathered so far, prior sessions' labels included.
//   3. The current classifier, refitted after every label once
//      both a match and a distinct pair exist.
//
// The final fit accepts a one-sided label set. The missing class
// is stood in for by its anchor: all-ones features (identical
// titles) for a match, all-zeros (nothing shared) for a distinct.
//
// The next question is always the unasked pool pair whose match
// probability is closest to 0.5.

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};

use crate::domain::record::{RecordKey, RecordPair, Records, TitleRecord};
use crate::domain::training_pairs::{Label, TrainingPairs};
use crate::ml::blocking::{learn_predicates, BlockIndex, Predicate};
use crate::ml::engine::{EngineConfig, EngineError};
use crate::ml::features::{compare, FieldDefinition, PreparedTitle, TfIdf};
use crate::ml::model::{GazetteerModel, LogisticModel};
use crate::ml::trainer::{fit, Example};

struct Candidate {
    messy_key:     RecordKey,
    canonical_key: RecordKey,
    features:      Vec<f64>,
}

pub struct ActiveLearningSession {
    fields:    Vec<FieldDefinition>,
    config:    EngineConfig,
    tfidf:     TfIdf,
    messy:     BTreeMap<RecordKey, PreparedTitle>,
    canonical: BTreeMap<RecordKey, PreparedTitle>,
    pool:      Vec<Candidate>,
    asked:     HashSet<(RecordKey, RecordKey)>,
    labels:    TrainingPairs,
    model:     LogisticModel,
}

impl ActiveLearningSession {
    pub fn new(
        fields:    Vec<FieldDefinition>,
        config:    EngineConfig,
        messy:     &Records,
        canonical: &Records,
        prior:     Option<&TrainingPairs>,
    ) -> Result<Self, EngineError> {
        if canonical.is_empty() {
            return Err(EngineError::EmptyCanonical);
        }

        let labels = prior.cloned().unwrap_or_default();

        // corpus for the Text comparator: every title we will ever compare
        let corpus = messy
            .values()
            .chain(canonical.values())
            .map(|r| r.title.as_str())
            .chain(labels.iter().flat_map(|(p, _)| [p.0.title.as_str(), p.1.title.as_str()]));
        let tfidf = TfIdf::fit(corpus);

        let prepare = |records: &Records| -> BTreeMap<RecordKey, PreparedTitle> {
            records.iter().map(|(k, r)| (*k, tfidf.prepare(&r.title))).collect()
        };
        let messy_prepared     = prepare(messy);
        let canonical_prepared = prepare(canonical);

        let model = LogisticModel::prior(fields.len());
        let mut session = Self {
            fields,
            config,
            tfidf,
            messy: messy_prepared,
            canonical: canonical_prepared,
            pool: Vec::new(),
            asked: HashSet::new(),
            labels,
            model,
        };

        session.pool = session.sample_pool();
        session.refit();

        tracing::info!(
            "Prepared active learning: {} candidate pairs, {} prior labels",
            session.pool_len(),
            session.labels.len()
        );
        Ok(session)
    }

    /// Blocked pairs first (up to their share), then random pairs.
    /// When the whole cross product fits in the sample, use all of it.
    fn sample_pool(&self) -> Vec<Candidate> {
        let canon_keys: Vec<RecordKey> = self.canonical.keys().copied().collect();
        let messy_keys: Vec<RecordKey> = self.messy.keys().copied().collect();
        let total = messy_keys.len() * canon_keys.len();

        let chosen = if total <= self.config.sample_size {
            messy_keys
                .iter()
                .flat_map(|m| canon_keys.iter().map(move |c| (*m, *c)))
                .collect()
        } else {
            self.sample_pairs(&messy_keys, &canon_keys)
        };

        chosen
            .into_iter()
            .filter(|(m, c)| {
                let (m, c) = (&self.messy[m], &self.canonical[c]);
                self.labels
                    .label_of(&TitleRecord::new(m.title.clone()), &TitleRecord::new(c.title.clone()))
                    .is_none()
            })
            .map(|(m, c)| Candidate {
                messy_key:     m,
                canonical_key: c,
                features:      compare(&self.fields, &self.messy[&m], &self.canonical[&c]),
            })
            .collect()
    }

    fn sample_pairs(
        &self,
        messy_keys: &[RecordKey],
        canon_keys: &[RecordKey],
    ) -> Vec<(RecordKey, RecordKey)> {
        let mut rng   = StdRng::seed_from_u64(self.config.seed);
        let target    = self.config.sample_size;
        let n_blocked = ((target as f64) * self.config.blocked_proportion).round() as usize;
        let blocks = BlockIndex::build(
            &Predicate::ALL,
            self.canonical.values().map(|p| p.title.as_str()),
        );

        let mut blocked: Vec<(RecordKey, RecordKey)> = self
            .messy
            .iter()
            .flat_map(|(mk, m)| {
                blocks
                    .candidates(&Predicate::ALL, &m.title)
                    .into_iter()
                    .map(|pos| (*mk, canon_keys[pos]))
                    .collect::<Vec<_>>()
            })
            .collect();
        blocked.shuffle(&mut rng);

        let mut seen: HashSet<(RecordKey, RecordKey)> = HashSet::new();
        let mut chosen: Vec<(RecordKey, RecordKey)> = Vec::new();
        for pair in blocked.into_iter() {
            if chosen.len() >= n_blocked {
                break;
            }
            if seen.insert(pair) {
                chosen.push(pair);
            }
        }

        let mut attempts = 0usize;
        let max_attempts = target.saturating_mul(10);
        while chosen.len() < target && attempts < max_attempts {
            attempts += 1;
            let m = messy_keys[rng.gen_range(0..messy_keys.len())];
            let c = canon_keys[rng.gen_range(0..canon_keys.len())];
            if seen.insert((m, c)) {
                chosen.push((m, c));
            }
        }
        chosen
    }

    fn examples(&self) -> Vec<Example> {
        self.labels
            .iter()
            .map(|(pair, label)| Example {
                features: compare(
                    &self.fields,
                    &self.tfidf.prepare(&pair.0.title),
                    &self.tfidf.prepare(&pair.1.title),
                ),
                target: if label == Label::Match { 1.0 } else { 0.0 },
            })
            .collect()
    }

    /// Labeled examples plus one anchor for each class nobody labeled.
    fn anchored_examples(&self) -> Vec<Example> {
        let counts = self.labels.counts();
        let mut examples = self.examples();
        if counts.matches == 0 {
            examples.push(Example { features: vec![1.0; self.fields.len()], target: 1.0 });
        }
        if counts.distinct == 0 {
            examples.push(Example { features: vec![0.0; self.fields.len()], target: 0.0 });
        }
        examples
    }

    fn has_both_labels(&self) -> bool {
        let counts = self.labels.counts();
        counts.matches > 0 && counts.distinct > 0
    }

    fn refit(&mut self) {
        self.model = if self.has_both_labels() {
            fit(&self.examples(), self.fields.len(), &self.config.trainer)
        } else {
            LogisticModel::prior(self.fields.len())
        };
    }

    pub fn next_uncertain_pair(&mut self) -> Option<RecordPair> {
        let uncertainty = |c: &Candidate| (self.model.probability(&c.features) - 0.5).abs();
        let best = self
            .pool
            .iter()
            .filter(|c| !self.asked.contains(&(c.messy_key, c.canonical_key)))
            .min_by(|a, b| uncertainty(a).total_cmp(&uncertainty(b)))?;

        let (mk, ck) = (best.messy_key, best.canonical_key);
        self.asked.insert((mk, ck));
        Some(RecordPair {
            messy_key:     mk,
            messy:         TitleRecord::new(self.messy[&mk].title.clone()),
            canonical_key: ck,
            canonical:     TitleRecord::new(self.canonical[&ck].title.clone()),
        })
    }

    pub fn record_label(&mut self, pair: &RecordPair, label: Label) {
        self.asked.insert((pair.messy_key, pair.canonical_key));
        self.labels.add(pair.to_labeled(), label);
        self.refit();
    }

    pub fn labels(&self) -> &TrainingPairs {
        &self.labels
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn train(&self) -> Result<GazetteerModel, EngineError> {
        let counts = self.labels.counts();
        if self.labels.is_empty() {
            return Err(EngineError::InsufficientLabels {
                matches:  counts.matches,
                distinct: counts.distinct,
            });
        }
        if !self.has_both_labels() {
            tracing::warn!(
                "Only one label class ({} matches / {} distinct); anchoring the other",
                counts.matches,
                counts.distinct
            );
        }

        let classifier = fit(&self.anchored_examples(), self.fields.len(), &self.config.trainer);
        let labeled: Vec<(&str, &str, Label)> = self
            .labels
            .iter()
            .map(|(p, l)| (p.0.title.as_str(), p.1.title.as_str(), l))
            .collect();
        let predicates = learn_predicates(&labeled);

        tracing::info!(
            "Trained on {} matches / {} distinct; predicates {:?}",
            counts.matches,
            counts.distinct,
            predicates
        );

        Ok(GazetteerModel {
            fields: self.fields.clone(),
            tfidf: self.tfidf.clone(),
            classifier,
            predicates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::records_from_titles;
    use crate::ml::features::title_fields;

    fn session(prior: Option<&TrainingPairs>) -> ActiveLearningSession {
        let messy = records_from_titles([
            "chief marketing officer",
            "marketing manager",
            "vice president sales",
            "software engineer",
        ]);
        let canonical = records_from_titles(["chief marketing officer", "marketing director"]);
        ActiveLearningSession::new(title_fields(), EngineConfig::default(), &messy, &canonical, prior)
            .unwrap()
    }

    #[test]
    fn test_pool_is_capped_by_cross_product() {
        assert_eq!(session(None).pool_len(), 8);
    }

    #[test]
    fn test_pairs_are_never_asked_twice() {
        let mut s = session(None);
        let mut seen = HashSet::new();
        while let Some(pair) = s.next_uncertain_pair() {
            assert!(seen.insert((pair.messy_key, pair.canonical_key)));
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_prior_labels_are_excluded_from_pool() {
        let mut prior = TrainingPairs::new();
        prior.add(
            (TitleRecord::new("chief marketing officer"), TitleRecord::new("chief marketing officer")),
            Label::Match,
        );
        let s = session(Some(&prior));
        assert_eq!(s.pool_len(), 7);
        assert_eq!(s.labels().counts().matches, 1);
    }

    #[test]
    fn test_train_needs_some_label() {
        let s = session(None);
        assert!(matches!(s.train(), Err(EngineError::InsufficientLabels { matches: 0, distinct: 0 })));
    }

    #[test]
    fn test_train_with_matches_only() {
        let messy     = records_from_titles(["chief marketing officer"]);
        let canonical = records_from_titles(["chief marketing officer"]);
        let mut s = ActiveLearningSession::new(title_fields(), EngineConfig::default(), &messy, &canonical, None)
            .unwrap();
        let pair = s.next_uncertain_pair().unwrap();
        s.record_label(&pair, Label::Match);
        assert!(s.next_uncertain_pair().is_none());

        let model = s.train().unwrap();
        let n     = model.fields.len();
        assert!(model.classifier.probability(&vec![1.0; n]) > 0.5);
        assert!(model.classifier.probability(&vec![0.0; n]) < 0.5);
    }

    #[test]
    fn test_train_with_distinct_only() {
        let mut s = session(None);
        let pair = RecordPair {
            messy_key:     3,
            messy:         TitleRecord::new("software engineer"),
            canonical_key: 1,
            canonical:     TitleRecord::new("marketing director"),
        };
        s.record_label(&pair, Label::Distinct);

        let model = s.train().unwrap();
        let n     = model.fields.len();
        assert!(model.classifier.probability(&vec![1.0; n]) > 0.5);
    }

    #[test]
    fn test_empty_canonical_is_rejected() {
        let messy = records_from_titles(["cmo"]);
        let err = ActiveLearningSession::new(title_fields(), EngineConfig::default(), &messy, &Records::new(), None);
        assert!(matches!(err, Err(EngineError::EmptyCanonical)));
    }
}

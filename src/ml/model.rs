// ============================================================
// Layer 5 — Gazetteer Model
// ============================================================
// Everything a trained gazetteer needs to score pairs again later:
//
//   fields     — which comparators produced the feature vector
//   tfidf      — document frequencies behind the Text comparator
//   classifier — logistic regression over the feature vector
//   predicates — the learned blocking predicates
//
// This is the state that ends up in the settings artifact. It is
// serialised with bincode behind a version number, so a model
// written by an incompatible build is refused instead of misread.

use serde::{Deserialize, Serialize};

use crate::ml::blocking::Predicate;
use crate::ml::features::{compare, FieldDefinition, PreparedTitle, TfIdf};

/// Bumped whenever GazetteerModel's layout changes.
pub const MODEL_VERSION: u32 = 1;

/// Logistic regression: P(match) = σ(w·x + b)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias:    f64,
}

impl LogisticModel {
    /// Untrained stand-in used until both labels have been seen:
    /// a steep sigmoid around the mean feature value.
    pub fn prior(n_features: usize) -> Self {
        const STEEPNESS: f64 = 6.0;
        let n = n_features.max(1) as f64;
        Self {
            weights: vec![STEEPNESS / n; n_features],
            bias:    -STEEPNESS / 2.0,
        }
    }

    pub fn probability(&self, features: &[f64]) -> f64 {
        let z = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazetteerModel {
    pub fields:     Vec<FieldDefinition>,
    pub tfidf:      TfIdf,
    pub classifier: LogisticModel,
    pub predicates: Vec<Predicate>,
}

impl GazetteerModel {
    pub fn prepare(&self, title: &str) -> PreparedTitle {
        self.tfidf.prepare(title)
    }

    /// Match probability of a prepared pair.
    pub fn score(&self, a: &PreparedTitle, b: &PreparedTitle) -> f64 {
        self.classifier.probability(&compare(&self.fields, a, b))
    }
}

/// On-disk wrapper that carries the layout version.
#[derive(Serialize, Deserialize)]
pub(crate) struct VersionedModel {
    pub version: u32,
    pub model:   GazetteerModel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prior_is_neutral_at_midpoint() {
        let prior = LogisticModel::prior(3);
        assert!((prior.probability(&[0.5, 0.5, 0.5]) - 0.5).abs() < 1e-12);
        assert!(prior.probability(&[1.0, 1.0, 1.0]) > 0.9);
        assert!(prior.probability(&[0.0, 0.0, 0.0]) < 0.1);
    }

    #[test]
    fn test_sigmoid_is_bounded() {
        assert!(sigmoid(50.0) <= 1.0);
        assert!(sigmoid(-50.0) >= 0.0);
        assert_eq!(sigmoid(0.0), 0.5);
    }
}

// ============================================================
// Layer 5 — Classifier Training
// ============================================================
// Fits the logistic regression behind the gazetteer with full-batch
// gradient descent and L2 regularisation on the weights:
//
//   loss = mean(-y·ln p - (1-y)·ln(1-p)) + λ/2 · ‖w‖²
//   w   -= lr · (Xᵀ(p - y)/n + λw)
//   b   -= lr · mean(p - y)
//
// The problem is convex, so starting from zero and running a fixed
// number of epochs gives the same weights on every run.
//
// Reference: Hastie, Tibshirani & Friedman, ESL §4.4 (Logistic Regression)

use serde::{Deserialize, Serialize};

use crate::ml::model::LogisticModel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Full passes over the labeled examples
    pub epochs:        usize,
    /// Step size applied to each gradient update
    pub learning_rate: f64,
    /// L2 penalty λ on the weights (the bias is not penalised)
    pub l2:            f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs:        2_000,
            learning_rate: 0.5,
            l2:            0.01,
        }
    }
}

/// One labeled feature vector; `target` is 1.0 for a match.
#[derive(Debug, Clone)]
pub struct Example {
    pub features: Vec<f64>,
    pub target:   f64,
}

pub fn fit(examples: &[Example], n_features: usize, cfg: &TrainerConfig) -> LogisticModel {
    let mut model = LogisticModel {
        weights: vec![0.0; n_features],
        bias:    0.0,
    };
    if examples.is_empty() {
        return model;
    }
    let n = examples.len() as f64;

    for _ in 0..cfg.epochs {
        let mut grad_w = vec![0.0; n_features];
        let mut grad_b = 0.0;

        for ex in examples {
            let err = model.probability(&ex.features) - ex.target;
            for (g, x) in grad_w.iter_mut().zip(&ex.features) {
                *g += err * x;
            }
            grad_b += err;
        }

        for (w, g) in model.weights.iter_mut().zip(&grad_w) {
            *w -= cfg.learning_rate * (g / n + cfg.l2 * *w);
        }
        model.bias -= cfg.learning_rate * grad_b / n;
    }

    tracing::debug!(
        "Fitted classifier on {} examples: weights={:?} bias={:.4} loss={:.4}",
        examples.len(),
        model.weights,
        model.bias,
        log_loss(&model, examples)
    );
    model
}

/// Mean cross-entropy of a model on labeled examples.
pub fn log_loss(model: &LogisticModel, examples: &[Example]) -> f64 {
    const EPS: f64 = 1e-12;
    if examples.is_empty() {
        return 0.0;
    }
    examples
        .iter()
        .map(|ex| {
            let p = model.probability(&ex.features).clamp(EPS, 1.0 - EPS);
            -(ex.target * p.ln() + (1.0 - ex.target) * (1.0 - p).ln())
        })
        .sum::<f64>()
        / examples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> Vec<Example> {
        vec![
            Example { features: vec![1.0, 0.95, 0.9], target: 1.0 },
            Example { features: vec![1.0, 1.0, 1.0],  target: 1.0 },
            Example { features: vec![0.0, 0.85, 0.6], target: 1.0 },
            Example { features: vec![0.0, 0.4, 0.0],  target: 0.0 },
            Example { features: vec![0.0, 0.55, 0.1], target: 0.0 },
            Example { features: vec![0.0, 0.3, 0.0],  target: 0.0 },
        ]
    }

    #[test]
    fn test_fit_separates_classes() {
        let data  = separable();
        let model = fit(&data, 3, &TrainerConfig::default());
        for ex in &data {
            let p = model.probability(&ex.features);
            if ex.target == 1.0 {
                assert!(p > 0.5, "match scored {p}");
            } else {
                assert!(p < 0.5, "distinct scored {p}");
            }
        }
    }

    #[test]
    fn test_fit_reduces_loss() {
        let data    = separable();
        let untrained = LogisticModel { weights: vec![0.0; 3], bias: 0.0 };
        let trained = fit(&data, 3, &TrainerConfig::default());
        assert!(log_loss(&trained, &data) < log_loss(&untrained, &data));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let data = separable();
        let cfg  = TrainerConfig::default();
        assert_eq!(fit(&data, 3, &cfg), fit(&data, 3, &cfg));
    }

    #[test]
    fn test_fit_on_nothing_is_zero_model() {
        let model = fit(&[], 2, &TrainerConfig::default());
        assert_eq!(model.weights, vec![0.0, 0.0]);
        assert_eq!(model.probability(&[1.0, 1.0]), 0.5);
    }
}

// ============================================================
// Layer 5 — Matching Engine
// ============================================================
// The bundled implementation of the MatchingEngine port. No other
// layer reaches into these modules; the application layer only sees
// the trait.
//
//   features.rs        — Exact / String / Text comparators, TF-IDF
//   blocking.rs        — blocking predicates and their learning
//   model.rs           — the serialisable trained model
//   trainer.rs         — logistic regression fitting
//   active_learning.rs — candidate pool and uncertainty sampling
//   index.rs           — canonical index and ranked search
//   engine.rs          — GazetteerEngine: the MatchingEngine impl

pub mod features;

pub mod blocking;

pub mod model;

pub mod trainer;

pub mod active_learning;

pub mod index;

pub mod engine;

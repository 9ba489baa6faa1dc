// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits that define the core
// concepts of the gazetteer:
//
//   record.rs         — keyed title records and messy/canonical pairs
//   training_pairs.rs — labeled match / distinct pairs
//   state.rs          — the training session state machine states
//   error.rs          — the error taxonomy shared by every layer
//   traits.rs         — the MatchingEngine and Labeler ports
//
// Rules for this layer:
//   - NO file I/O or console interaction
//   - NO matching-engine internals (features, classifier, blocking)
//   - Only plain Rust types and the traits other layers implement

pub mod record;

pub mod training_pairs;

pub mod state;

pub mod error;

pub mod traits;

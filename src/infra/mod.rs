// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns the use cases rely on but don't own:
//
//   artifact_store.rs — per-category training pairs and learned
//                       settings on disk, written atomically and
//                       guarded against cross-category reuse
//
//   logging.rs        — the per-session tracing subscriber
//                       (category log file + stderr)
//
//   metrics.rs        — evaluation hit rates, appended to a CSV
//                       next to the category's logs
//
//   replay_labeler.rs — a Labeler that answers from a recorded
//                       training file instead of a human

/// Training pairs and learned settings persistence
pub mod artifact_store;

/// Session-scoped tracing subscriber
pub mod logging;

/// Evaluation metrics CSV logger
pub mod metrics;

/// Non-interactive labeling from recorded labels
pub mod replay_labeler;

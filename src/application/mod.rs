// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Coordinates the other layers for one session of one category.
//
// Rules for this layer:
//   - No matching math here (that's Layer 5)
//   - No printing or prompting here (that's Layer 1)
//   - No direct file parsing here (that's Layer 4 and 6)
//   - Only workflow coordination and session state
//
// Both use cases are generic over the MatchingEngine port, so the
// bundled engine can be swapped without touching this layer.

// Paths and category of the running session
pub mod context;

// The active-learning training workflow
pub mod train_use_case;

// The held-out evaluation workflow
pub mod evaluate_use_case;

// ============================================================
// Layer 3 — Training Session States
// ============================================================
//   Init → Preparing → Labeling → Trained → Persisted → Indexed
//
// Nothing is written to disk before Trained. A session can only
// move forward; Indexed is terminal.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrainingState {
    Init,
    Preparing,
    Labeling,
    Trained,
    Persisted,
    Indexed,
}

impl fmt::Display for TrainingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainingState::Init      => "init",
            TrainingState::Preparing => "preparing",
            TrainingState::Labeling  => "labeling",
            TrainingState::Trained   => "trained",
            TrainingState::Persisted => "persisted",
            TrainingState::Indexed   => "indexed",
        };
        f.write_str(name)
    }
}

// ============================================================
// Layer 6 — Replay Labeler
// ============================================================
// Answers labeling questions from a recorded training file instead
// of a human. Lets a category be retrained non-interactively, e.g.
// after the messy export changed.
//
// A pair found in the recording gets its recorded label. Unknown
// pairs are skipped as uncertain; after `patience` unknown pairs in
// a row the replay declares itself finished.

use std::io;

use crate::domain::record::RecordPair;
use crate::domain::traits::{LabelDecision, LabelProgress, Labeler};
use crate::domain::training_pairs::{Label, TrainingPairs};

pub const DEFAULT_PATIENCE: usize = 50;

pub struct ReplayLabeler {
    recorded:           TrainingPairs,
    patience:           usize,
    consecutive_misses: usize,
}

impl ReplayLabeler {
    pub fn new(recorded: TrainingPairs, patience: usize) -> Self {
        Self { recorded, patience, consecutive_misses: 0 }
    }
}

impl Labeler for ReplayLabeler {
    fn label(&mut self, pair: &RecordPair, _progress: &LabelProgress) -> io::Result<LabelDecision> {
        match self.recorded.label_of(&pair.messy, &pair.canonical) {
            Some(label) => {
                self.consecutive_misses = 0;
                Ok(match label {
                    Label::Match    => LabelDecision::Match,
                    Label::Distinct => LabelDecision::Distinct,
                })
            }
            None => {
                self.consecutive_misses += 1;
                if self.consecutive_misses >= self.patience {
                    Ok(LabelDecision::Finished)
                } else {
                    Ok(LabelDecision::Uncertain)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::TitleRecord;

    fn pair(messy: &str, canonical: &str) -> RecordPair {
        RecordPair {
            messy_key:     0,
            messy:         TitleRecord::new(messy),
            canonical_key: 0,
            canonical:     TitleRecord::new(canonical),
        }
    }

    #[test]
    fn test_replays_recorded_labels() {
        let mut recorded = TrainingPairs::new();
        recorded.add((TitleRecord::new("cmo"), TitleRecord::new("cmo")), Label::Match);
        recorded.add((TitleRecord::new("hr"), TitleRecord::new("cmo")), Label::Distinct);
        let mut replay = ReplayLabeler::new(recorded, 2);
        let p = LabelProgress::default();

        assert_eq!(replay.label(&pair("cmo", "cmo"), &p).unwrap(), LabelDecision::Match);
        assert_eq!(replay.label(&pair("hr", "cmo"), &p).unwrap(), LabelDecision::Distinct);
    }

    #[test]
    fn test_finishes_after_patience_runs_out() {
        let mut replay = ReplayLabeler::new(TrainingPairs::new(), 2);
        let p = LabelProgress::default();

        assert_eq!(replay.label(&pair("a", "b"), &p).unwrap(), LabelDecision::Uncertain);
        assert_eq!(replay.label(&pair("c", "d"), &p).unwrap(), LabelDecision::Finished);
    }
}

// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure names the category whose session failed, so logs
// from several categories never get confused with one another.
//
//   DataFormat        — malformed or missing input; fatal before persistence
//   ArtifactMissing   — evaluation requested before training
//   ArtifactCorrupt   — a persisted artifact cannot be decoded
//   EngineFailure     — the matching engine failed; carries the stage
//   LabelingCancelled — the operator aborted labeling; nothing was written
//   OutOfOrder        — a session step was run from the wrong state
//   Io                — the filesystem refused a read or write

use std::{io, path::PathBuf};
use thiserror::Error;

use crate::domain::state::TrainingState;

#[derive(Debug, Error)]
pub enum GazetteerError {
    #[error("[{category}] malformed input '{input}': {reason}")]
    DataFormat {
        category: String,
        input:    String,
        reason:   String,
    },

    #[error(
        "[{category}] no learned settings at '{}'; run `train --category {category}` first",
        path.display()
    )]
    ArtifactMissing { category: String, path: PathBuf },

    #[error("[{category}] artifact '{}' is corrupt: {reason}", path.display())]
    ArtifactCorrupt {
        category: String,
        path:     PathBuf,
        reason:   String,
    },

    #[error("[{category}] matching engine failed while {stage}: {reason}")]
    EngineFailure {
        category: String,
        stage:    String,
        reason:   String,
    },

    #[error("[{category}] labeling cancelled; no artifacts were written")]
    LabelingCancelled { category: String },

    #[error("[{category}] session step needs state {expected}, but the session is {actual}")]
    OutOfOrder {
        category: String,
        expected: TrainingState,
        actual:   TrainingState,
    },

    #[error("[{category}] I/O error on '{}'", path.display())]
    Io {
        category: String,
        path:     PathBuf,
        #[source]
        source:   io::Error,
    },
}

impl GazetteerError {
    pub fn data_format(
        category: impl Into<String>,
        input:    impl Into<String>,
        reason:   impl Into<String>,
    ) -> Self {
        GazetteerError::DataFormat {
            category: category.into(),
            input:    input.into(),
            reason:   reason.into(),
        }
    }

    pub fn io(category: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        GazetteerError::Io {
            category: category.into(),
            path:     path.into(),
            source,
        }
    }

    /// The category the failing session belonged to.
    pub fn category(&self) -> &str {
        match self {
            GazetteerError::DataFormat { category, .. }
            | GazetteerError::ArtifactMissing { category, .. }
            | GazetteerError::ArtifactCorrupt { category, .. }
            | GazetteerError::EngineFailure { category, .. }
            | GazetteerError::LabelingCancelled { category }
            | GazetteerError::OutOfOrder { category, .. }
            | GazetteerError::Io { category, .. } => category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_category() {
        let err = GazetteerError::ArtifactMissing {
            category: "marketing".into(),
            path:     PathBuf::from("output/marketing/learned_settings"),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("[marketing]"));
        assert!(msg.contains("train --category marketing"));
        assert_eq!(err.category(), "marketing");
    }
}

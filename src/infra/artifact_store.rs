// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Owns the two files a training session leaves behind for each
// category:
//
//   output/
//     <category>/
//       training.json      ← labeled match / distinct pairs (JSON)
//       learned_settings   ← versioned envelope around the engine's
//                            serialised model (bincode)
//
// `output/<category>/` is created by the first save. Loading, a
// cancelled session or a failed training never create it, so a
// category nobody finished training has no directory at all.
//
// Writes go to a temporary file in the same directory which is
// synced and then renamed over the target, so a crash mid-write
// leaves either the old file or the new one, never half of one.
//
// The settings envelope records the category it was trained for.
// Loading it under any other category is refused even if the file
// was copied across directories by hand.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};
use tempfile::NamedTempFile;

use crate::domain::error::GazetteerError;
use crate::domain::training_pairs::{LabelCounts, TrainingPairs};

pub const TRAINING_FILE: &str = "training.json";
pub const SETTINGS_FILE: &str = "learned_settings";

/// Bumped whenever SettingsEnvelope's layout changes.
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Opaque engine state as stored in the settings artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedSettings(Vec<u8>);

impl LearnedSettings {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Serialize, Deserialize)]
struct SettingsEnvelope {
    format_version: u32,
    category:       String,
    engine_state:   Vec<u8>,
}

/// Category-namespaced persistence under one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `root/<category>`; the category must be a single plain path component.
    pub fn category_dir(&self, category: &str) -> Result<PathBuf, GazetteerError> {
        let mut components = Path::new(category).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(category)),
            _ => Err(GazetteerError::data_format(
                category,
                "category name",
                "must be a single directory name",
            )),
        }
    }

    /// Create the category directory if needed; every save goes through here.
    pub fn ensure_category_dir(&self, category: &str) -> Result<PathBuf, GazetteerError> {
        let dir = self.category_dir(category)?;
        fs::create_dir_all(&dir).map_err(|e| GazetteerError::io(category, &dir, e))?;
        Ok(dir)
    }

    pub fn training_path(&self, category: &str) -> Result<PathBuf, GazetteerError> {
        Ok(self.category_dir(category)?.join(TRAINING_FILE))
    }

    pub fn settings_path(&self, category: &str) -> Result<PathBuf, GazetteerError> {
        Ok(self.category_dir(category)?.join(SETTINGS_FILE))
    }

    // ─── Training pairs ──────────────────────────────────────────────────────

    /// Prior labels, or None on the first session for this category.
    pub fn load_training(&self, category: &str) -> Result<Option<TrainingPairs>, GazetteerError> {
        let path = self.training_path(category)?;
        if !path.exists() {
            return Ok(None);
        }
        read_training_file(&path, category).map(Some)
    }

    pub fn save_training(&self, category: &str, pairs: &TrainingPairs) -> Result<(), GazetteerError> {
        let dir  = self.ensure_category_dir(category)?;
        let path = dir.join(TRAINING_FILE);
        let json = serde_json::to_vec_pretty(pairs).map_err(|e| GazetteerError::ArtifactCorrupt {
            category: category.to_string(),
            path:     path.clone(),
            reason:   e.to_string(),
        })?;

        write_atomic(&dir, &path, &json).map_err(|e| GazetteerError::io(category, &path, e))?;
        tracing::info!("Saved {} labeled pairs to '{}'", pairs.len(), path.display());
        Ok(())
    }

    /// Match / distinct totals of the stored training file.
    pub fn label_counts(&self, category: &str) -> Result<Option<LabelCounts>, GazetteerError> {
        Ok(self.load_training(category)?.map(|pairs| pairs.counts()))
    }

    // ─── Learned settings ────────────────────────────────────────────────────

    pub fn load_settings(&self, category: &str) -> Result<LearnedSettings, GazetteerError> {
        let path  = self.settings_path(category)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(GazetteerError::ArtifactMissing { category: category.to_string(), path });
            }
            Err(e) => return Err(GazetteerError::io(category, &path, e)),
        };

        let corrupt = |reason: String| GazetteerError::ArtifactCorrupt {
            category: category.to_string(),
            path:     path.clone(),
            reason,
        };

        let envelope: SettingsEnvelope =
            bincode::deserialize(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if envelope.format_version != SETTINGS_FORMAT_VERSION {
            return Err(corrupt(format!(
                "settings format version {} (expected {})",
                envelope.format_version, SETTINGS_FORMAT_VERSION
            )));
        }
        if envelope.category != category {
            return Err(corrupt(format!(
                "settings were trained for category '{}', not '{}'",
                envelope.category, category
            )));
        }

        tracing::debug!("Loaded learned settings from '{}'", path.display());
        Ok(LearnedSettings(envelope.engine_state))
    }

    pub fn save_settings(&self, category: &str, settings: &LearnedSettings) -> Result<(), GazetteerError> {
        let dir  = self.ensure_category_dir(category)?;
        let path = dir.join(SETTINGS_FILE);
        let envelope = SettingsEnvelope {
            format_version: SETTINGS_FORMAT_VERSION,
            category:       category.to_string(),
            engine_state:   settings.0.clone(),
        };
        let bytes = bincode::serialize(&envelope).map_err(|e| GazetteerError::ArtifactCorrupt {
            category: category.to_string(),
            path:     path.clone(),
            reason:   e.to_string(),
        })?;

        write_atomic(&dir, &path, &bytes).map_err(|e| GazetteerError::io(category, &path, e))?;
        tracing::info!("Saved learned settings to '{}'", path.display());
        Ok(())
    }
}

/// Parse a training-pairs file from any path (also used for replays).
pub fn read_training_file(path: &Path, category: &str) -> Result<TrainingPairs, GazetteerError> {
    let json = fs::read(path).map_err(|e| GazetteerError::io(category, path, e))?;
    serde_json::from_slice(&json).map_err(|e| GazetteerError::ArtifactCorrupt {
        category: category.to_string(),
        path:     path.to_path_buf(),
        reason:   e.to_string(),
    })
}

/// Write `bytes` to `path` via a synced temp file in `dir` and a rename.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::TitleRecord;
    use crate::domain::training_pairs::Label;

    fn pairs() -> TrainingPairs {
        let mut p = TrainingPairs::new();
        p.add((TitleRecord::new("cmo"), TitleRecord::new("chief marketing officer")), Label::Match);
        p.add((TitleRecord::new("hr"), TitleRecord::new("chief marketing officer")), Label::Distinct);
        p
    }

    #[test]
    fn test_first_run_has_no_training() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.load_training("Marketing").unwrap().is_none());
        assert!(store.label_counts("Marketing").unwrap().is_none());
    }

    #[test]
    fn test_training_round_trip_and_counts() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save_training("Marketing", &pairs()).unwrap();

        assert_eq!(store.load_training("Marketing").unwrap(), Some(pairs()));
        assert_eq!(
            store.label_counts("Marketing").unwrap(),
            Some(LabelCounts { matches: 1, distinct: 1 })
        );
        assert!(dir.path().join("Marketing").join(TRAINING_FILE).exists());
    }

    #[test]
    fn test_save_overwrites_without_leftovers() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save_training("Marketing", &TrainingPairs::new()).unwrap();
        store.save_training("Marketing", &pairs()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path().join("Marketing")).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.load_training("Marketing").unwrap(), Some(pairs()));
    }

    #[test]
    fn test_loads_never_create_the_category_dir() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.load_training("Marketing").unwrap().is_none());
        assert!(store.load_settings("Marketing").is_err());
        assert!(!dir.path().join("Marketing").exists());

        // the first save creates it, later saves reuse it
        store.save_training("Marketing", &pairs()).unwrap();
        store.save_settings("Marketing", &LearnedSettings::new(vec![7])).unwrap();
        assert!(dir.path().join("Marketing").is_dir());
        assert_eq!(fs::read_dir(dir.path().join("Marketing")).unwrap().count(), 2);
    }

    #[test]
    fn test_missing_settings() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err   = store.load_settings("Marketing").unwrap_err();
        assert!(matches!(err, GazetteerError::ArtifactMissing { .. }));
    }

    #[test]
    fn test_settings_round_trip() {
        let dir      = tempfile::tempdir().unwrap();
        let store    = ArtifactStore::new(dir.path());
        let settings = LearnedSettings::new(vec![1, 2, 3, 4]);
        store.save_settings("Marketing", &settings).unwrap();
        assert_eq!(store.load_settings("Marketing").unwrap(), settings);
    }

    #[test]
    fn test_settings_are_bound_to_their_category() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save_settings("Marketing", &LearnedSettings::new(vec![9])).unwrap();

        // copy A's settings into B's directory by hand
        store.ensure_category_dir("Sales").unwrap();
        fs::copy(
            store.settings_path("Marketing").unwrap(),
            store.settings_path("Sales").unwrap(),
        )
        .unwrap();

        let err = store.load_settings("Sales").unwrap_err();
        assert!(matches!(err, GazetteerError::ArtifactCorrupt { .. }));
        assert!(err.to_string().contains("'Marketing'"));
    }

    #[test]
    fn test_corrupt_settings_name_the_path() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.ensure_category_dir("Marketing").unwrap();
        fs::write(store.settings_path("Marketing").unwrap(), b"\x01").unwrap();

        let err = store.load_settings("Marketing").unwrap_err();
        assert!(matches!(err, GazetteerError::ArtifactCorrupt { .. }));
        assert!(err.to_string().contains(SETTINGS_FILE));
    }

    #[test]
    fn test_corrupt_training_is_not_treated_as_absent() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.ensure_category_dir("Marketing").unwrap();
        fs::write(store.training_path("Marketing").unwrap(), b"{not json").unwrap();

        assert!(matches!(
            store.load_training("Marketing"),
            Err(GazetteerError::ArtifactCorrupt { .. })
        ));
    }

    #[test]
    fn test_category_must_be_one_component() {
        let store = ArtifactStore::new("output");
        assert!(store.category_dir("../etc").is_err());
        assert!(store.category_dir("a/b").is_err());
        assert!(store.category_dir("").is_err());
        assert_eq!(store.category_dir("Sales").unwrap(), PathBuf::from("output").join("Sales"));
    }
}

// ============================================================
// Layer 2 — Session Context
// ============================================================
// Everything a single `train` or `evaluate` run needs to know
// about where things live, computed once from the CLI flags:
//
//   input/cats.yaml              canonical taxonomy
//   input/<messy file>           messy titles (CSV)
//   input/test.yaml              evaluation samples
//   output/<category>/           training pairs + learned settings
//   logs/<category>/logs.log     session log file
//
// The context is passed explicitly to each use case; nothing
// reads paths from globals.
//
// Reference: Rust Book §5 (Using Structs to Structure Related Data)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::infra::artifact_store::ArtifactStore;

pub const TAXONOMY_FILE: &str = "cats.yaml";
pub const TEST_FILE:     &str = "test.yaml";
pub const LOG_FILE:      &str = "logs.log";

// ─── Path Configuration ──────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Holds cats.yaml, test.yaml and the messy titles CSV
    pub input_dir:  PathBuf,
    /// Parent of every category's artifact directory
    pub output_dir: PathBuf,
    /// Parent of every category's log directory
    pub logs_dir:   PathBuf,
    /// Messy titles CSV, relative to `input_dir` unless absolute
    pub messy_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir:  PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            logs_dir:   PathBuf::from("logs"),
            messy_file: PathBuf::from("messy.csv"),
        }
    }
}

// ─── SessionContext ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Taxonomy key this session works on
    pub category:      String,
    /// input/cats.yaml
    pub taxonomy_file: PathBuf,
    /// Messy titles CSV, already resolved against the input directory
    pub messy_file:    PathBuf,
    /// input/test.yaml
    pub test_file:     PathBuf,
    /// Artifact root; the store adds the category directory
    pub output_dir:    PathBuf,
    /// logs/<category>/
    pub log_dir:       PathBuf,
}

impl SessionContext {
    pub fn new(category: impl Into<String>, paths: &PathsConfig) -> Self {
        let category = category.into();
        Self {
            taxonomy_file: taxonomy_path(paths),
            messy_file:    paths.input_dir.join(&paths.messy_file),
            test_file:     paths.input_dir.join(TEST_FILE),
            output_dir:    paths.output_dir.clone(),
            log_dir:       paths.logs_dir.join(&category),
            category,
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE)
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.output_dir)
    }
}

/// Where the taxonomy lives, before a category has been chosen.
pub fn taxonomy_path(paths: &PathsConfig) -> PathBuf {
    paths.input_dir.join(TAXONOMY_FILE)
}

// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and their
// flags. Both take the same --category / directory flags through a
// flattened `SessionArgs`; the rest are per command.
//
// clap's derive macros generate from these structs:
//   - help text (--help), taken from the `///` doc comments
//   - errors for a missing --category or a malformed number
//   - parsing of each flag into its field type (PathBuf, usize, f64)
//
// Each argument struct converts into its application-layer config
// via `From`, so nothing below this layer depends on clap:
//
//   TrainArgs    → TrainConfig    (paths + engine + persist policy)
//   EvaluateArgs → EvaluateConfig (paths + top_k + threshold)
//
// Reference: Rust Book §12 (Building a CLI Program)
//            Rust Book §10 (Traits: From / Into)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    context::PathsConfig,
    evaluate_use_case::EvaluateConfig,
    train_use_case::TrainConfig,
};
use crate::ml::engine::EngineConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Label candidate pairs for a category and train its gazetteer
    Train(TrainArgs),

    /// Score the category's test samples against its trained gazetteer
    Evaluate(EvaluateArgs),
}

impl Commands {
    /// Subcommand name, recorded on the session span
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Train(_)    => "train",
            Commands::Evaluate(_) => "evaluate",
        }
    }

    /// The shared flags, whichever command was chosen
    pub fn session(&self) -> &SessionArgs {
        match self {
            Commands::Train(a)    => &a.session,
            Commands::Evaluate(a) => &a.session,
        }
    }
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Category to work on; must be a key of <input-dir>/cats.yaml.
    /// Also names the per-category output and log directories
    #[arg(long)]
    pub category: String,

    /// Directory holding cats.yaml, test.yaml and the messy CSV
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    /// Directory for per-category training pairs and learned settings,
    /// written to <output-dir>/<category>/
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Directory for per-category log files (<logs-dir>/<category>/logs.log)
    #[arg(long, default_value = "logs")]
    pub logs_dir: PathBuf,
}

impl SessionArgs {
    /// Directory layout for this run; only `train` reads a messy file
    pub fn paths(&self, messy_file: PathBuf) -> PathsConfig {
        PathsConfig {
            input_dir:  self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            logs_dir:   self.logs_dir.clone(),
            messy_file,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Messy titles CSV (needs a `title` column), relative to --input-dir
    #[arg(long, default_value = "messy.csv")]
    pub messy_file: PathBuf,

    /// Titles longer than this many characters are dropped, both
    /// before and after abbreviation expansion
    #[arg(long, default_value_t = 60)]
    pub max_title_len: usize,

    /// Share of candidate pairs drawn from blocked (likely similar) pairs.
    /// The rest are random pairs, mostly obvious non-matches
    #[arg(long, default_value_t = 0.5)]
    pub blocked_proportion: f64,

    /// Number of candidate pairs sampled for active learning.
    /// When messy × canonical is smaller, every pair is a candidate
    #[arg(long, default_value_t = 1500)]
    pub sample_size: usize,

    /// Seed for candidate sampling; the same seed asks the same pairs
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Attempts at writing the artifacts before giving up
    #[arg(long, default_value_t = 3)]
    pub persist_attempts: usize,

    /// Milliseconds to wait before the first write retry.
    /// Each later retry waits twice as long as the one before
    #[arg(long, default_value_t = 100)]
    pub persist_backoff_ms: u64,

    /// Answer from a recorded training.json instead of prompting.
    /// Pairs it has no label for are skipped as unsure
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            paths:              a.session.paths(a.messy_file),
            max_title_len:      a.max_title_len,
            engine:             EngineConfig {
                sample_size:        a.sample_size,
                blocked_proportion: a.blocked_proportion,
                seed:               a.seed,
                ..EngineConfig::default()
            },
            persist_attempts:   a.persist_attempts,
            persist_backoff_ms: a.persist_backoff_ms,
            replay:             a.replay,
        }
    }
}

/// All arguments for the `evaluate` command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Candidates reported per test sample; also the k of the top-k rate
    #[arg(long, default_value_t = 3)]
    pub top_k: usize,

    /// Minimum confidence (0-1) a candidate needs to be reported.
    /// 0 reports every candidate up to --top-k
    #[arg(long, default_value_t = 0.0)]
    pub threshold: f64,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            paths:     a.session.paths(PathBuf::from("messy.csv")),
            top_k:     a.top_k,
            threshold: a.threshold,
        }
    }
}

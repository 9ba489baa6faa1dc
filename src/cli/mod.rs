// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// Business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — label pairs and train a category's gazetteer
//   2. `evaluate` — rank the category's test samples with it
//
// Every run goes through the same steps before dispatch:
//   load the taxonomy → validate --category → open the category
//   log file → run the command inside a `session` span

pub mod commands;
pub mod console_labeler;
pub mod report;

use anyhow::{bail, Result};
use clap::Parser;
use commands::Commands;

use crate::application::{
    context::{taxonomy_path, PathsConfig, SessionContext},
    evaluate_use_case::{EvaluateConfig, EvaluateUseCase},
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::data::taxonomy::CategoryTaxonomy;
use crate::domain::{error::GazetteerError, traits::Labeler};
use crate::infra::{
    artifact_store::read_training_file,
    logging::session_subscriber,
    metrics::MetricsLogger,
    replay_labeler::{ReplayLabeler, DEFAULT_PATIENCE},
};
use crate::ml::engine::{EngineConfig, GazetteerEngine};
use console_labeler::ConsoleLabeler;

#[derive(Parser, Debug)]
#[command(
    name = "title-gazetteer",
    version = "0.1.0",
    about = "Match messy job titles to a canonical category taxonomy with an actively-trained gazetteer."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Convert the arguments, then run the command as one session.
    pub fn run(self) -> Result<()> {
        let command  = self.command.name();
        let category = self.command.session().category.clone();

        match self.command {
            Commands::Train(args) => {
                let config: TrainConfig = args.into();
                let paths = config.paths.clone();
                in_session(command, &category, &paths, |ctx, taxonomy| run_train(ctx, taxonomy, config))
            }
            Commands::Evaluate(args) => {
                let config: EvaluateConfig = args.into();
                let paths = config.paths.clone();
                in_session(command, &category, &paths, |ctx, taxonomy| run_evaluate(ctx, taxonomy, config))
            }
        }
    }
}

/// Load the taxonomy, reject unknown categories, then run `f` with the
/// session's log subscriber installed.
fn in_session<F>(command: &str, category: &str, paths: &PathsConfig, f: F) -> Result<()>
where
    F: FnOnce(SessionContext, CategoryTaxonomy) -> Result<()>,
{
    let taxonomy = CategoryTaxonomy::load(&taxonomy_path(paths), category)?;
    if !taxonomy.contains(category) {
        let choices: Vec<&str> = taxonomy.names().collect();
        bail!("invalid category '{}' (choose from: {})", category, choices.join(", "));
    }

    let ctx        = SessionContext::new(category, paths);
    let subscriber = session_subscriber(&ctx)?;

    tracing::subscriber::with_default(subscriber, || {
        let span   = tracing::info_span!("session", category = %category, command = %command);
        let _guard = span.enter();

        let result = f(ctx, taxonomy);
        if let Err(e) = &result {
            match e.downcast_ref::<GazetteerError>() {
                Some(err) => tracing::error!(category = err.category(), "{}", err),
                None      => tracing::error!("{:#}", e),
            }
        }
        result
    })
}

/// Handles the `train` subcommand.
fn run_train(ctx: SessionContext, taxonomy: CategoryTaxonomy, config: TrainConfig) -> Result<()> {
    tracing::info!("Starting training for category '{}'", ctx.category);

    let mut labeler: Box<dyn Labeler> = match &config.replay {
        Some(path) => {
            let recorded = read_training_file(path, &ctx.category)?;
            tracing::info!("Replaying {} recorded labels from '{}'", recorded.len(), path.display());
            Box::new(ReplayLabeler::new(recorded, DEFAULT_PATIENCE))
        }
        None => Box::new(ConsoleLabeler::stdio()),
    };

    let engine  = GazetteerEngine::new(config.engine.clone());
    let mut uc  = TrainUseCase::new(ctx, taxonomy, config, engine);
    let summary = match uc.execute(labeler.as_mut()) {
        Ok(summary) => summary,
        Err(GazetteerError::LabelingCancelled { .. }) => {
            tracing::info!("Session cancelled by the operator");
            println!("Labeling cancelled; nothing was saved.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Training complete.");
    println!("Number of matches: {}", summary.labels.matches);
    println!("Number of distinct: {}", summary.labels.distinct);
    println!("Total labeled pairs: {}", summary.labels.total());
    Ok(())
}

/// Handles the `evaluate` subcommand.
fn run_evaluate(ctx: SessionContext, taxonomy: CategoryTaxonomy, config: EvaluateConfig) -> Result<()> {
    tracing::info!("Starting evaluation for category '{}'", ctx.category);

    let engine  = GazetteerEngine::new(EngineConfig { threshold: config.threshold, ..EngineConfig::default() });
    let top_k   = config.top_k;
    let log_dir = ctx.log_dir.clone();
    let report  = EvaluateUseCase::new(ctx, taxonomy, config, engine).execute()?;

    let metrics = MetricsLogger::new(log_dir)?;
    metrics.log(&report.metrics)?;
    tracing::info!("Appended evaluation metrics to '{}'", metrics.csv_path().display());

    print!("{}", report::render(&report, top_k));
    Ok(())
}

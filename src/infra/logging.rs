// ============================================================
// Layer 6 — Session Logging
// ============================================================
// Builds the tracing subscriber for one session. Two sinks:
//
//   logs/<category>/logs.log — everything the filter lets through,
//                              appended, no colours
//   stderr                   — warnings and errors only, so the
//                              console stays readable while labeling
//
// The filter defaults to `title_gazetteer=info` and honours RUST_LOG.
// The caller installs the subscriber with
// `tracing::subscriber::with_default`, so it lives exactly as long as
// the session does.

use anyhow::{Context, Result};
use std::{fs, io, sync::Mutex};
use tracing::Level;
use tracing_subscriber::{fmt, fmt::writer::MakeWriterExt, prelude::*, EnvFilter};

use crate::application::context::SessionContext;

pub const DEFAULT_DIRECTIVE: &str = "title_gazetteer=info";

pub fn session_subscriber(ctx: &SessionContext) -> Result<impl tracing::Subscriber + Send + Sync> {
    fs::create_dir_all(&ctx.log_dir)
        .with_context(|| format!("Cannot create log directory '{}'", ctx.log_dir.display()))?;

    let log_path = ctx.log_file();
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Cannot open log file '{}'", log_path.display()))?;

    let filter = EnvFilter::from_default_env().add_directive(DEFAULT_DIRECTIVE.parse()?);

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(fmt::layer().with_writer(io::stderr.with_max_level(Level::WARN))))
}

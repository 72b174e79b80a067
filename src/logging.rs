//! Run log.
//!
//! Events go through `tracing` and end up as one line each in a size-bounded
//! rotating file. The subscriber is installed as the thread default for as
//! long as the returned [`LogHandle`] lives, so a run owns its logger instead
//! of sharing a process-wide one.

mod format;
mod rotating;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing::{Level, Subscriber, subscriber::DefaultGuard};
use tracing_subscriber::fmt::MakeWriter;

pub use format::*;
pub use rotating::*;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub path: PathBuf,

    pub policy: RotationPolicy,
}

/// Keeps the run logger installed until dropped.
#[must_use = "the logger is uninstalled when the handle is dropped"]
pub struct LogHandle {
    _guard: DefaultGuard,
}

pub fn install(config: &LogConfig) -> Result<LogHandle> {
    let file = RotatingFile::open(&config.path, config.policy)
        .with_context(|| format!("failed to open log file: {}", config.path.display()))?;

    let guard = tracing::subscriber::set_default(subscriber(file));

    Ok(LogHandle { _guard: guard })
}

/// Subscriber writing `INFO` and above in [`LineFormat`] to `make_writer`.
pub fn subscriber<W>(make_writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_ansi(false)
        .event_format(LineFormat)
        .with_writer(make_writer)
        .finish()
}

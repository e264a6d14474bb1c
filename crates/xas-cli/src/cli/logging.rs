use anyhow::Context;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub(super) const RUN_LOG_FILE: &str = "xas_batch.log";
const LOG_ENV: &str = "XAS_LOG";

static INIT: Once = Once::new();

/// Installs the global subscriber: stderr always, plus an appended plain-text
/// run log when `log_dir` is given.
///
/// Only the first call in a process installs anything.
pub(super) fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let run_log = match log_dir {
        Some(dir) => Some(open_run_log(dir)?),
        None => None,
    };

    INIT.call_once(move || {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let file_layer = run_log.map(|file| {
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
        });

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(file_layer)
            .with(filter)
            .init();
    });
    Ok(())
}

fn open_run_log(dir: &Path) -> anyhow::Result<File> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    let path = dir.join(RUN_LOG_FILE);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open run log '{}'", path.display()))
}

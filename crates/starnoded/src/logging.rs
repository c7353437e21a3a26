//! Log setup: stderr for the operator, a per-node file for `show-log`.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

use starnode_core::config::LogConfig;

/// Install the global subscriber and return the log file path.
///
/// The file is `node-<name>.log` and is truncated if a previous run left one
/// behind. It records everything at DEBUG; stderr follows `RUST_LOG`
/// (default `info`).
pub fn init(name: &str, config: &LogConfig) -> Result<PathBuf> {
    let path = config.file_path(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log dir: {}", parent.display()))?;
    }

    let rolled_over = path.exists();
    let file = File::create(&path)
        .with_context(|| format!("failed to open log file: {}", path.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .with_filter(LevelFilter::DEBUG);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to install log subscriber")?;

    if rolled_over {
        tracing::debug!(path = %path.display(), "previous log truncated");
    }
    Ok(path)
}

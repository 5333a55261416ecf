//! Tracing setup for both run modes.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use tracing_subscriber::EnvFilter;
use ymdeck_types::EffectiveConfig;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// `<dir>/<year>.<month>.<day>.log`, without zero padding.
pub fn daily_log_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.{}.{}.log", date.year(), date.month(), date.day()))
}

/// Open (append) today's log file under `dir`, creating the directory.
pub fn open_daily_log(dir: &Path) -> Result<File> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let path = daily_log_path(dir, chrono::Local::now().date_naive());
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Plugin mode: the host owns stdout and stderr, so logs go to a file.
pub fn init_file(dir: &Path) -> Result<()> {
    let file = open_daily_log(dir)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Interactive mode: logs on stderr.
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Record which files were loaded and where each non-default key came from.
pub fn log_config_sources(effective: &EffectiveConfig) {
    for path in &effective.source_files {
        tracing::info!(path = %path.display(), "loaded config file");
    }
    for (key, source) in effective.overrides() {
        tracing::debug!(key, source = %source, "config override");
    }
}

/// Log panics instead of letting them vanish with the host's stderr.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panic");
    }));
}

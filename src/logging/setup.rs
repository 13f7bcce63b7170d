use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::formatter::BracketedFormatter;
use crate::error::DatasetResult;

/// Default filter when `RUST_LOG` is unset: crate debug, everything else info
pub const DEFAULT_FILTER: &str = "info,satpop=debug";

/// Install the global subscriber: a timestamped log file in `log_dir` plus stderr.
///
/// Stdout is left to command output, so results printed there stay machine-readable.
///
/// # Returns
/// * `Ok(PathBuf)` with the log file path
/// * `Err(DatasetError::IoError)` if the directory or file cannot be created
pub fn setup_logging(log_dir: &Path) -> DatasetResult<PathBuf> {
    fs::create_dir_all(log_dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_path = log_dir.join(format!("satpop_{}.log", timestamp));

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)?;

    let file_layer = fmt::layer()
        .event_format(BracketedFormatter::detailed())
        .with_writer(Mutex::new(file))
        .with_ansi(false);

    let terminal_layer = fmt::layer()
        .event_format(BracketedFormatter::compact())
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(file_layer)
        .with(terminal_layer)
        .init();

    info!("Log file created at: {:?}", log_path);
    Ok(log_path)
}

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::Result;

const DEFAULT_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "webhook_logs";

pub struct FileLogger {
    log_directory: PathBuf,
}

impl FileLogger {
    pub fn new(log_directory: PathBuf) -> Self {
        Self { log_directory }
    }

    /// Creates the log directory and a non-blocking rolling writer into it.
    ///
    /// The guard must outlive every log call or buffered lines are dropped.
    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard)> {
        std::fs::create_dir_all(&self.log_directory)?;

        let file_appender = RollingFileAppender::new(
            Rotation::DAILY,
            &self.log_directory,
            LOG_FILE_PREFIX,
        );

        Ok(tracing_appender::non_blocking(file_appender))
    }
}

/// Console logging filtered by `RUST_LOG`, plus a rolling file when `log_dir` is set.
pub fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = FileLogger::new(dir.to_path_buf()).setup_file_logging()?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer()) // Console output
        .with(file_layer)
        .init();

    Ok(guard)
}

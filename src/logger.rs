use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;
use crate::errors::AppError;

const LOG_FILE_NAME: &str = "fmn-rules.log";

/// Set up application logging based on configuration.
///
/// `RUST_LOG` overrides the configured level. Without a log file path, logs
/// go to stderr and no guard is returned.
pub fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>, AppError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    match config.log_file_path() {
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish();
            set_global(subscriber)?;
            Ok(None)
        }
        Some(path) => {
            let (file_writer, guard) = create_file_logger(Path::new(path))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(file_writer)
                .with_ansi(false)
                .finish();
            set_global(subscriber)?;
            Ok(Some(guard))
        }
    }
}

fn set_global<S>(subscriber: S) -> Result<(), AppError>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(|e| AppError::Generic {
        message: format!("Failed to set global tracing subscriber: {}", e),
    })
}

// Create a non-rotating file logger at the given path
fn create_file_logger(log_path: &Path) -> Result<(NonBlocking, WorkerGuard), AppError> {
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(default_log_dir);

    // Create the directory if it doesn't exist
    std::fs::create_dir_all(&log_dir).map_err(|e| AppError::Generic {
        message: format!("Failed to create log directory {}: {}", log_dir.display(), e),
    })?;

    let log_file_name = log_path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new(LOG_FILE_NAME));

    let file_appender = tracing_appender::rolling::never(&log_dir, log_file_name);
    Ok(tracing_appender::non_blocking(file_appender))
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("fmn-rules")
        .join("logs")
}

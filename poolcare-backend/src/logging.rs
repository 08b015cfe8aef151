use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use anyhow::Context;
use tokio::task;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tracing_subscriber::filter::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

/// Log files older than this are deleted at startup
const MAX_LOG_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 3);

#[allow(dead_code)]
pub struct LoggerGuard(WorkerGuard);

/// Console and daily-rolling file logging; `RUST_LOG` overrides `level`
pub fn init_logging(log_dir: impl AsRef<Path>, prefix: &str, level: &str) -> anyhow::Result<LoggerGuard> {
    let log_dir = log_dir.as_ref().to_path_buf();

    let level = match level.parse::<LevelFilter>() {
        Ok(level) => level,
        Err(_) => {
            eprintln!("Invalid log level '{}', defaulting to 'info'", level);
            LevelFilter::INFO
        }
    };

    let builder = EnvFilter::builder().with_default_directive(level.into());

    let console_filter = builder.clone().parse_lossy(std::env::var("RUST_LOG").unwrap_or_default());
    let file_filter = builder.parse_lossy(std::env::var("RUST_LOG").unwrap_or_default());

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(&log_dir)
        .with_context(|| format!("Failed to create file appender in {:?}", log_dir))?;
    let (non_blocking, guard) = NonBlocking::new(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(file_filter);
    // Command output goes to stdout, so logs go to stderr
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LoggerGuard(guard))
}

/// Delete this program's log files older than three days
pub async fn prune_old_logs(log_dir: impl Into<PathBuf>, prefix: &str) {
    let log_dir = log_dir.into();
    let prefix = prefix.to_string();

    let result = task::spawn_blocking(move || cleanup_old_logs(&log_dir, &prefix, MAX_LOG_AGE)).await;
    match result {
        Ok(Ok(0)) => {}
        Ok(Ok(deleted)) => tracing::debug!("Deleted {} old log files", deleted),
        Ok(Err(e)) => tracing::warn!("Failed to delete old log file: {}", e),
        Err(e) => tracing::warn!("Log cleanup task failed: {}", e),
    }
}

fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_age: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut deleted = 0;

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if file_name.starts_with(prefix) && file_name.ends_with(".log") {
                let metadata = fs::metadata(&path)?;
                if let Ok(modified) = metadata.modified() {
                    if now.duration_since(modified).unwrap_or_default() > max_age {
                        fs::remove_file(&path)?;
                        tracing::info!("Old log file deleted: {}", file_name);
                        deleted += 1;
                    }
                }
            }
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cleanup_keeps_recent_and_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("poolcare.2024-06-01.log"), "x").unwrap();
        fs::write(temp_dir.path().join("other.2024-06-01.log"), "x").unwrap();

        let deleted = cleanup_old_logs(temp_dir.path(), "poolcare", MAX_LOG_AGE).unwrap();
        assert_eq!(deleted, 0);

        // Zero max age: every matching file is old enough
        std::thread::sleep(Duration::from_millis(10));
        let deleted = cleanup_old_logs(temp_dir.path(), "poolcare", Duration::ZERO).unwrap();
        assert_eq!(deleted, 1);
        assert!(temp_dir.path().join("other.2024-06-01.log").exists());
    }
}

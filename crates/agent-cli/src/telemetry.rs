//! Logging Setup
//!
//! Console logs go to stderr at `RUST_LOG` (default `info`) so stdout carries only
//! the transcript. A detailed debug log with source locations goes to a file.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directives for the file log
const FILE_FILTER: &str = "debug,hyper=info,hyper_util=info,reqwest=info,sqlx=warn";

/// Install the global subscriber, with a debug file layer when `log_file` is set
pub fn init_telemetry(log_file: Option<&Path>) -> anyhow::Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let file = log_file
        .map(|path| -> anyhow::Result<_> {
            let writer = open_log_file(path)?;
            Ok(fmt::layer()
                .with_writer(Mutex::new(writer))
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(EnvFilter::new(FILE_FILTER)))
        })
        .transpose()?;

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .ok();

    if let Some(path) = log_file {
        tracing::debug!(path = %path.display(), "File logging enabled");
    }
    Ok(())
}

/// Open `path` for appending, creating its directory first
pub fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "first").unwrap();
        drop(file);

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_unwritable_log_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("logs");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = open_log_file(&blocker.join("app.log")).unwrap_err();
        assert!(err.to_string().contains("failed to create log directory"));
    }
}

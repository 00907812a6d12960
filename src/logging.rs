//! Tracing setup for the command-line tool.
//!
//! Log output always goes to a daily file under `dir`; a compact stderr layer is added when
//! `console` is set. `RUST_LOG` overrides the level chosen by `debug`.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub dir: Utf8PathBuf,
    /// File name prefix; the appender adds the date
    pub file_prefix: String,
    pub debug: bool,
    pub console: bool,
}

impl LogOptions {
    pub fn new(dir: impl Into<Utf8PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_prefix: file_prefix.into(),
            debug: false,
            console: true,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// `RUST_LOG` wins when set.
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(if self.debug { "debug" } else { "info" }))
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped, so `main` holds it until exit.
pub fn init(options: &LogOptions) -> Result<WorkerGuard> {
    ensure_log_dir(&options.dir)?;

    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
        &options.dir,
        &options.file_prefix,
    ));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = options.console.then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(options.filter())
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(?options, "Logging initialized");
    Ok(guard)
}

fn ensure_log_dir(dir: &Utf8Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_directory_created() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = Utf8PathBuf::try_from(temp_dir.path().join("nested").join("logs")).unwrap();

        // Installing a global subscriber here would leak into other tests
        ensure_log_dir(&log_dir).unwrap();
        assert!(log_dir.is_dir());
        ensure_log_dir(&log_dir).unwrap();
    }

    #[test]
    fn test_options_builder() {
        let options = LogOptions::new("logs", "modsieve")
            .with_debug(true)
            .with_console(false);
        assert_eq!(options.dir, "logs");
        assert_eq!(options.file_prefix, "modsieve");
        assert!(options.debug);
        assert!(!options.console);
    }
}

//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over `--log-level`. The full-screen UI owns
//! the terminal, so interactive mode only logs to a file; legacy mode also
//! logs to stderr.

use std::{io, path::Path};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError,
};

use crate::Mode;

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Log file directory could not be created.
    #[error("cannot create log directory {path}: {source}")]
    Directory {
        /// Directory that failed.
        path: String,
        /// Underlying error.
        source: io::Error,
    },

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the level filter from `RUST_LOG`, falling back to `level`.
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the lifetime of the process.
pub fn init(mode: Mode, level: &str, file: Option<&Path>) -> Result<Option<WorkerGuard>, LoggingError> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if mode == Mode::Legacy {
        layers.push(tracing_subscriber::fmt::layer().with_writer(io::stderr).boxed());
    }

    let guard = match file {
        Some(path) => {
            let (layer, guard) = file_layer(path)?;
            layers.push(layer);
            Some(guard)
        },
        None => None,
    };

    tracing_subscriber::registry().with(layers).with(filter(level)).try_init()?;
    Ok(guard)
}

fn file_layer(path: &Path) -> Result<(BoxedLayer, WorkerGuard), LoggingError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .map_err(|source| LoggingError::Directory { path: dir.display().to_string(), source })?;

    let name = path.file_name().map_or_else(|| "termgram.log".into(), |n| n.to_os_string());
    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false).boxed();
    Ok((layer, guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_directory_is_reported() {
        let err = file_layer(Path::new("/dev/null/logs/termgram.log")).err();

        assert!(matches!(err, Some(LoggingError::Directory { .. })));
    }
}

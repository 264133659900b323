use std::path::PathBuf;

use crate::sink::SinkError;

/// Failures that abort a parse run.
///
/// Malformed log content never surfaces here; it is skipped line by line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read log {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parser config {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("event sink rejected a write: {0}")]
    Sink(#[source] SinkError),
}

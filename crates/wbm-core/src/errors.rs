use std::path::PathBuf;

/// Core error type.
///
/// Per-message send failures are *not* errors: they become `DispatchOutcome`s.
/// This type covers batch-level conditions (config, invalid input, storage).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("batch file {path}: {reason}")]
    BatchFile { path: PathBuf, reason: String },

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error types for runlog-digest
//!
//! Every error is fatal to the run it concerns. The only input that is
//! dropped without an error is non-telemetry noise (see [`crate::digest`]).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// runlog-digest error types
#[derive(Error, Debug)]
pub enum Error {
    /// Raw log, filtered log, or run directory does not exist
    #[error("Input not found: {}", path.display())]
    InputNotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// Malformed telemetry line (bad separator usage or non-integer value)
    #[error("Telemetry parse error: {reason}\nLine: {line:?}")]
    Parse {
        /// Offending line, without its terminator
        line: String,
        /// What was wrong with it
        reason: String,
    },

    /// Run filename does not match the hyperparameter schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Telemetry line lacks a required field
    #[error("Missing field '{field}' on telemetry line {line_number}")]
    MissingField {
        /// Name of the required field
        field: String,
        /// 1-based line number within the filtered log
        line_number: usize,
    },

    /// Digest source and destination are the same file
    #[error("Refusing to digest {} onto itself", path.display())]
    SameFile {
        /// Path given as both source and destination
        path: PathBuf,
    },

    /// Pipeline configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Rendering backend failure
    #[error("Render error: {0}")]
    Render(String),

    /// Run record / Parquet persistence failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Optimizer process could not be spawned
    #[error("Launch error: {0}")]
    Launch(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::Parse`] for `line`, dropping any trailing terminator.
    pub(crate) fn parse(line: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            line: line.trim_end_matches(['\r', '\n']).to_string(),
            reason: reason.into(),
        }
    }

    /// Map an IO error on `path` to [`Error::InputNotFound`] when the file is
    /// missing, and to [`Error::Io`] otherwise.
    pub(crate) fn from_open(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}

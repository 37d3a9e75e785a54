//! Error types for tracker operations.
//!
//! Every fallible operation in the crate returns [`TrackerError`]. The variants
//! follow the way failures are handled at the caller's boundary: validation
//! failures abort before any state changes, CSV row failures are recorded and
//! skipped, and extraction failures distinguish a deadline from other causes.

use std::time::Duration;
use thiserror::Error;

use crate::PaperId;

/// Represents errors that can occur while tracking papers.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Empty, oversized or malformed input. Nothing was changed.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Input parsed as JSON but carried none of the recognized paper keys.
    #[error("Input is not a structured paper record: {0}")]
    StructureMismatch(String),

    /// The external extraction call did not finish before its deadline.
    #[error("Request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// The external extraction call was cancelled by the caller.
    #[error("Extraction was cancelled")]
    Cancelled,

    /// The referenced location could not be reached.
    #[error("URL not accessible: {0}")]
    Unreachable(String),

    /// A single CSV row could not be read.
    #[error("Malformed row at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No paper with id {0}")]
    NotFound(PaperId),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TrackerError {
    /// Returns `true` for failures that leave the collection untouched and
    /// can simply be reported to the user.
    pub fn is_validation(&self) -> bool {
        matches!(self, TrackerError::Validation(_))
    }

    /// Returns `true` if the error came from the extraction deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TrackerError::Timeout(_))
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Validation(err.to_string())
    }
}

impl From<toml::de::Error> for TrackerError {
    fn from(err: toml::de::Error) -> Self {
        TrackerError::Config(err.to_string())
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for TrackerError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        TrackerError::Parse {
            line,
            message: err.to_string(),
        }
    }
}

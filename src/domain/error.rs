//! Error types for callerid.

use thiserror::Error;

/// Main error type for callerid.
///
/// The first five variants are per-token ACCEPT outcomes: they are reported
/// to the invoking user and never abort the connection or the command batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallerIdError {
    /// Nick did not resolve to a connected user
    #[error("No such nick: {0}")]
    TargetNotFound(String),

    /// Accept list already holds the configured maximum
    #[error("Accept list is full (limit is {0})")]
    CapacityExceeded(usize),

    /// Target is already on the accept list
    #[error("{0} is already on the accept list")]
    DuplicateEntry(String),

    /// Target is not on the accept list
    #[error("{0} is not on the accept list")]
    NotPresent(String),

    /// Action not allowed from this session
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for CallerIdError {
    fn from(e: serde_json::Error) -> Self {
        CallerIdError::Json(e.to_string())
    }
}

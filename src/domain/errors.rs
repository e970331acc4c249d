//! Domain errors for togglekeeper.
//!
//! None of these are fatal. Every failure degrades to "do nothing this
//! cycle" and is only observable through the logs.

use thiserror::Error;

/// Errors raised while locating, clicking or persisting the toggle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToggleError {
    #[error("Control not found: {0}")]
    ControlNotFound(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Ambiguous control state: both enable and disable controls are rendered")]
    AmbiguousControlState,

    #[error("Invalid stored value {value:?} for key {key}")]
    InvalidStoredValue { key: String, value: String },

    #[error("Reconciliation engine has stopped")]
    EngineStopped,
}

pub type DomainResult<T> = Result<T, ToggleError>;

impl From<std::io::Error> for ToggleError {
    fn from(err: std::io::Error) -> Self {
        ToggleError::PersistenceFailure(err.to_string())
    }
}

impl From<serde_json::Error> for ToggleError {
    fn from(err: serde_json::Error) -> Self {
        ToggleError::PersistenceFailure(err.to_string())
    }
}

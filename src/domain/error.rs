use thiserror::Error;

/// Malformed record input. Raised before any I/O and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Log message must not be empty")]
    EmptyMessage,

    #[error("Unknown severity: {0:?}")]
    UnknownSeverity(String),
}

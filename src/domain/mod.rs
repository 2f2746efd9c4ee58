//! Domain layer for log-relay.
//!
//! Contains the canonical types shared across all modules:
//! - `LogRecord`: The immutable entry that flows through the pipeline
//! - `RecordFactory`: Validated construction with the configured source
//! - `Severity`: Record severity (Debug/Info/Warn/Error)
//! - `ValidationError`: Rejection of malformed input before any I/O

pub mod error;
pub mod log_record;
pub mod severity;

pub use error::ValidationError;
pub use log_record::{LogRecord, Payload, RecordFactory};
pub use severity::Severity;

#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::cast_possible_truncation, // Millisecond durations fit in u64
    clippy::cast_precision_loss,      // Jitter math only
    clippy::cast_sign_loss,           // Jitter factor is always positive
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,  // e.g. RetryError in retry module
    clippy::must_use_candidate
)]

pub mod app;
pub mod domain;
pub mod reliability;
pub mod sender;

// Re-export main types for easy access
pub use app::{App, Config};
pub use domain::{LogRecord, RecordFactory, Severity, ValidationError};
pub use reliability::{
    DeliveryOrchestrator, DeliveryOutcome, LoggingUnavailableError, RetryPolicy, SubmitError,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

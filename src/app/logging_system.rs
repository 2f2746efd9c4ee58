use super::config::{LogFormat, LogLevel};
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("Invalid directive format '{input}'. Expected: 'target=level'")]
    InvalidDirectiveFormat { input: String },

    #[error("Logging system initialization failed: {details}")]
    LoggingInitFailed {
        details: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A `target=level` filter entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirective {
    pub target: String,
    pub level: LogLevel,
}

impl LogDirective {
    pub fn new(target: impl Into<String>, level: LogLevel) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }

    pub fn parse(directive: &str) -> Result<Self, InitializationError> {
        let invalid = || InitializationError::InvalidDirectiveFormat {
            input: directive.to_string(),
        };

        let (target, level) = directive.split_once('=').ok_or_else(invalid)?;
        let target = target.trim();
        if target.is_empty() {
            return Err(invalid());
        }

        let level = <LogLevel as clap::ValueEnum>::from_str(level.trim(), true)
            .map_err(|_| invalid())?;
        Ok(Self::new(target, level))
    }

    pub fn to_filter_string(&self) -> String {
        format!("{}={}", self.target, self.level.as_str())
    }
}

/// Filter directives for the relay's own `tracing` output.
pub struct LoggingSystem {
    directives: Arc<RwLock<Vec<LogDirective>>>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add_directive(&self, directive_str: &str) -> Result<(), InitializationError> {
        let directive = LogDirective::parse(directive_str)?;
        self.directives.write().push(directive);
        Ok(())
    }

    /// Quiets the HTTP stack so per-attempt noise stays out of the relay's output.
    pub fn add_default_directives(&self) {
        let default_directives = [
            ("hyper", LogLevel::Warn),
            ("hyper_util", LogLevel::Warn),
            ("reqwest", LogLevel::Warn),
            ("h2", LogLevel::Warn),
            ("rustls", LogLevel::Warn),
        ];

        let mut directives = self.directives.write();
        for (target, level) in default_directives {
            directives.push(LogDirective::new(target, level));
        }
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let directives = self.directives.read();

        let mut filter_parts = Vec::with_capacity(directives.len() + 1);
        filter_parts.push(default_level.as_str().to_string());
        filter_parts.extend(directives.iter().map(LogDirective::to_filter_string));

        filter_parts.join(",")
    }

    pub fn initialize_tracing(
        &self,
        default_level: LogLevel,
        format: LogFormat,
    ) -> Result<(), InitializationError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter = EnvFilter::try_new(&filter_string).map_err(|e| {
            InitializationError::LoggingInitFailed {
                details: format!("Failed to create EnvFilter with '{filter_string}'"),
                source: Box::new(e),
            }
        })?;

        let result = match format {
            LogFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr)
                        .compact(),
                )
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(false)
                        .with_writer(std::io::stderr),
                )
                .try_init(),
        };

        result.map_err(|e| InitializationError::LoggingInitFailed {
            details: "Failed to set global tracing subscriber".to_string(),
            source: Box::new(e),
        })
    }

    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the global subscriber once per process. Later calls report the
/// outcome of the first one.
pub fn setup_logging(level: LogLevel, format: LogFormat) -> Result<(), InitializationError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();

    let outcome = INIT.get_or_init(|| {
        let logging_system = LoggingSystem::new();
        logging_system.add_default_directives();
        logging_system
            .initialize_tracing(level, format)
            .map_err(|e| e.to_string())
    });

    outcome
        .clone()
        .map_err(|details| InitializationError::LoggingInitFailed {
            details,
            source: Box::new(std::io::Error::other("logging initialization error")),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_directive_parsing() {
        assert_eq!(
            LogDirective::parse("hyper=warn").unwrap(),
            LogDirective::new("hyper", LogLevel::Warn)
        );
        assert_eq!(
            LogDirective::parse(" log_relay = DEBUG ").unwrap(),
            LogDirective::new("log_relay", LogLevel::Debug)
        );
        assert!(LogDirective::parse("invalid").is_err());
        assert!(LogDirective::parse("=warn").is_err());
        assert!(LogDirective::parse("target=loud").is_err());
    }

    #[test]
    fn test_build_filter_string() {
        let logging_system = LoggingSystem::new();
        assert_eq!(logging_system.build_filter_string(LogLevel::Info), "info");

        logging_system.add_directive("hyper=warn").unwrap();
        logging_system.add_directive("reqwest=error").unwrap();
        assert_eq!(
            logging_system.build_filter_string(LogLevel::Debug),
            "debug,hyper=warn,reqwest=error"
        );
    }

    #[test]
    fn test_add_default_directives() {
        let logging_system = LoggingSystem::new();
        logging_system.add_default_directives();
        assert_eq!(logging_system.directive_count(), 5);
    }

    #[test]
    fn test_concurrent_directive_modification() {
        let logging_system = Arc::new(LoggingSystem::new());

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let logging_system = logging_system.clone();
                thread::spawn(move || {
                    logging_system.add_directive(&format!("target{i}=info"))
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(logging_system.directive_count(), 50);
    }

    #[test]
    fn test_setup_logging_is_idempotent() {
        let first = setup_logging(LogLevel::Info, LogFormat::Compact).is_ok();
        let second = setup_logging(LogLevel::Debug, LogFormat::Json).is_ok();
        assert_eq!(first, second);
    }
}

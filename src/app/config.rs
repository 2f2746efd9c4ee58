use crate::reliability::{BackoffConfig, DiskConfig, RetryError, RetryPolicy, RetryStrategy};
use clap::{Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Environment error: {0}")]
    EnvError(String),
    #[error(transparent)]
    Retry(#[from] RetryError),
}

/// Verbosity of the relay's own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Deployment environment; anything but production tags the record source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
}

impl Environment {
    pub fn source_suffix(&self) -> Option<&'static str> {
        match self {
            Environment::Production => None,
            Environment::Staging => Some("staging"),
            Environment::Development => Some("dev"),
        }
    }
}

const DEFAULT_ENDPOINT: &str = "http://localhost:9600/v1/logs";
const DEFAULT_SERVICE_NAME: &str = "log-relay";

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name stamped on every record (falls back to the hostname)
    #[arg(long, env = "LOG_SERVICE_NAME")]
    pub service_name: Option<String>,

    /// Deployment environment
    #[arg(long, env = "LOG_ENVIRONMENT", default_value = "production")]
    pub environment: Environment,

    /// Remote collector endpoint URL
    #[arg(long, env = "LOG_COLLECTOR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Remote delivery attempts per record
    #[arg(long, env = "LOG_MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: u32,

    /// Per-attempt timeout in milliseconds
    #[arg(long, env = "LOG_TIMEOUT_MS", default_value = "2000")]
    pub timeout_ms: u64,

    /// Delay strategy between remote attempts
    #[arg(long, env = "LOG_RETRY_STRATEGY", default_value = "exponential-backoff")]
    pub retry_strategy: RetryStrategy,

    /// Base retry delay in milliseconds
    #[arg(long, env = "LOG_BASE_DELAY_MS", default_value = "200")]
    pub base_delay_ms: u64,

    /// Maximum retry delay in milliseconds
    #[arg(long, env = "LOG_MAX_DELAY_MS", default_value = "5000")]
    pub max_delay_ms: u64,

    /// Randomize retry delays by ±50%
    #[arg(long, env = "LOG_RETRY_JITTER")]
    pub retry_jitter: bool,

    /// Directory holding the fallback file
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Size cap for the fallback file in MB (0 disables the cap)
    #[arg(long, env = "LOG_MAX_FALLBACK_MB", default_value = "512")]
    pub max_fallback_mb: u64,

    /// fsync the fallback file after every append
    #[arg(long, env = "LOG_SYNC_ON_WRITE")]
    pub sync_on_write: bool,

    /// Diagnostics level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Diagnostics output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Configuration file path (optional)
    #[arg(long, env = "LOG_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: None,
            environment: Environment::Production,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_attempts: 3,
            timeout_ms: 2000,
            retry_strategy: RetryStrategy::ExponentialBackoff,
            base_delay_ms: 200,
            max_delay_ms: 5000,
            retry_jitter: false,
            log_dir: PathBuf::from("logs"),
            max_fallback_mb: 512,
            sync_on_write: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            config_file: None,
            timeout: Duration::from_millis(2000),
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct ConfigArgs {
    #[command(flatten)]
    config: Config,
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = ConfigArgs::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?
            .config;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        load_env_string_opt("LOG_SERVICE_NAME", &mut config.service_name);
        load_env_enum("LOG_ENVIRONMENT", &mut config.environment)?;
        load_env_string("LOG_COLLECTOR_ENDPOINT", &mut config.endpoint);
        load_env_var("LOG_MAX_ATTEMPTS", &mut config.max_attempts)?;
        load_env_var("LOG_TIMEOUT_MS", &mut config.timeout_ms)?;
        load_env_enum("LOG_RETRY_STRATEGY", &mut config.retry_strategy)?;
        load_env_var("LOG_BASE_DELAY_MS", &mut config.base_delay_ms)?;
        load_env_var("LOG_MAX_DELAY_MS", &mut config.max_delay_ms)?;
        load_env_var("LOG_RETRY_JITTER", &mut config.retry_jitter)?;
        load_env_path("LOG_DIR", &mut config.log_dir);
        load_env_var("LOG_MAX_FALLBACK_MB", &mut config.max_fallback_mb)?;
        load_env_var("LOG_SYNC_ON_WRITE", &mut config.sync_on_write)?;
        load_env_enum("LOG_LEVEL", &mut config.log_level)?;
        load_env_enum("LOG_FORMAT", &mut config.log_format)?;
        load_env_path_opt("LOG_CONFIG_FILE", &mut config.config_file);

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.timeout = Duration::from_millis(self.timeout_ms);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "Max attempts must be greater than 0".to_string(),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigError::InvalidConfig(format!(
                "Max retry delay ({}ms) must be at least the base delay ({}ms)",
                self.max_delay_ms, self.base_delay_ms
            )));
        }

        if let Some(name) = &self.service_name
            && name.trim().is_empty()
        {
            return Err(ConfigError::InvalidConfig(
                "Service name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Service name, or the machine hostname when none is configured.
    pub fn resolve_service_name(&self) -> String {
        if let Some(name) = &self.service_name {
            return name.clone();
        }

        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string())
    }

    /// Value of the `source` field on records emitted with this config.
    pub fn source(&self) -> String {
        let service = self.resolve_service_name();
        match self.environment.source_suffix() {
            Some(suffix) => format!("{service}-{suffix}"),
            None => service,
        }
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let backoff = BackoffConfig {
            strategy: self.retry_strategy,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.retry_jitter,
        };

        Ok(
            RetryPolicy::new(&self.endpoint, self.max_attempts, self.timeout)?
                .with_backoff(backoff),
        )
    }

    pub fn disk_config(&self) -> DiskConfig {
        DiskConfig {
            log_dir: self.log_dir.clone(),
            max_file_bytes: (self.max_fallback_mb > 0)
                .then(|| self.max_fallback_mb.saturating_mul(1024 * 1024)),
            sync_on_write: self.sync_on_write,
        }
    }
}

/// Helper function to load and parse an environment variable.
/// Returns Ok(()) if the variable doesn't exist (keeps default).
fn load_env_var<T>(name: &str, target: &mut T) -> Result<(), ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(value) = std::env::var(name) {
        *target = value
            .parse()
            .map_err(|e| ConfigError::EnvError(format!("Invalid {name}: {e}")))?;
    }
    Ok(())
}

/// Helper function to load a case-insensitive enum environment variable.
fn load_env_enum<T: ValueEnum>(name: &str, target: &mut T) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(name) {
        *target = T::from_str(&value, true)
            .map_err(|e| ConfigError::EnvError(format!("Invalid {name}: {e}")))?;
    }
    Ok(())
}

fn load_env_string_opt(name: &str, target: &mut Option<String>) {
    if let Ok(value) = std::env::var(name) {
        *target = Some(value);
    }
}

fn load_env_string(name: &str, target: &mut String) {
    if let Ok(value) = std::env::var(name) {
        *target = value;
    }
}

fn load_env_path(name: &str, target: &mut PathBuf) {
    if let Ok(value) = std::env::var(name) {
        *target = PathBuf::from(value);
    }
}

fn load_env_path_opt(name: &str, target: &mut Option<PathBuf>) {
    if let Ok(value) = std::env::var(name) {
        *target = Some(PathBuf::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let mut config = Config::default();
        config.post_process().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_source_suffix_per_environment() {
        let mut config = Config {
            service_name: Some("billing".to_string()),
            ..Config::default()
        };
        assert_eq!(config.source(), "billing");

        config.environment = Environment::Staging;
        assert_eq!(config.source(), "billing-staging");

        config.environment = Environment::Development;
        assert_eq!(config.source(), "billing-dev");
    }

    #[test]
    fn test_disk_config_zero_disables_cap() {
        let config = Config {
            max_fallback_mb: 0,
            ..Config::default()
        };
        assert_eq!(config.disk_config().max_file_bytes, None);

        let config = Config {
            max_fallback_mb: 2,
            ..Config::default()
        };
        assert_eq!(config.disk_config().max_file_bytes, Some(2 * 1024 * 1024));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let mut config = Config {
            max_attempts: 4,
            timeout_ms: 750,
            retry_strategy: RetryStrategy::LinearBackoff,
            ..Config::default()
        };
        config.post_process().unwrap();

        let policy = config.retry_policy().unwrap();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.timeout(), Duration::from_millis(750));
        assert_eq!(policy.backoff().strategy, RetryStrategy::LinearBackoff);
        assert!(!policy.backoff().jitter);
    }

    #[test]
    fn test_validate_rejects_max_delay_below_base() {
        let config = Config {
            base_delay_ms: 1000,
            max_delay_ms: 10,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }
}

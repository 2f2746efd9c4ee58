use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum RetryError {
    #[error("Invalid retry configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid collector endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    /// Retry straight away
    Immediate,
    FixedDelay,
    LinearBackoff,
    ExponentialBackoff,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    pub strategy: RetryStrategy,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::ExponentialBackoff,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl BackoffConfig {
    pub fn immediate() -> Self {
        Self {
            strategy: RetryStrategy::Immediate,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay before retry number `retry` (0 is the pause after the first failed attempt).
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        let base_millis = self.base_delay.as_millis() as u64;
        let delay = match self.strategy {
            RetryStrategy::Immediate => return Duration::ZERO,
            RetryStrategy::FixedDelay => self.base_delay,
            RetryStrategy::LinearBackoff => {
                Duration::from_millis(base_millis.saturating_mul(retry as u64 + 1))
            }
            RetryStrategy::ExponentialBackoff => {
                let multiplier = 2_u64.checked_pow(retry).unwrap_or(u64::MAX);
                Duration::from_millis(base_millis.saturating_mul(multiplier))
            }
        };

        let capped_delay = std::cmp::min(delay, self.max_delay);

        if self.jitter {
            apply_jitter(capped_delay)
        } else {
            capped_delay
        }
    }
}

fn apply_jitter(delay: Duration) -> Duration {
    let mut rng = rand::rng();
    let jitter_factor = rng.random_range(0.5..1.5); // ±50% jitter
    let jittered_millis = (delay.as_millis() as f64 * jitter_factor) as u64;
    Duration::from_millis(jittered_millis)
}

/// How a record is delivered to the remote collector.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    endpoint: Url,
    timeout: Duration,
    backoff: BackoffConfig,
}

impl RetryPolicy {
    pub fn new(endpoint: &str, max_attempts: u32, timeout: Duration) -> Result<Self, RetryError> {
        if max_attempts == 0 {
            return Err(RetryError::InvalidConfig(
                "max attempts must be greater than 0".to_string(),
            ));
        }
        if timeout.is_zero() {
            return Err(RetryError::InvalidConfig(
                "per-attempt timeout must be greater than 0".to_string(),
            ));
        }

        let endpoint = Url::parse(endpoint).map_err(|source| RetryError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;

        Ok(Self {
            max_attempts,
            endpoint,
            timeout,
            backoff: BackoffConfig::default(),
        })
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }
}

use super::transmission::AttemptError;
use super::{RecordTransport, RemoteSink};
use crate::domain::LogRecord;
use crate::reliability::RetryPolicy;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// The remote sink gave up after exhausting its attempts.
#[derive(Error, Debug)]
#[error("remote delivery failed after {attempts} attempt(s): {last}")]
pub struct RemoteDeliveryError {
    pub attempts: u32,
    #[source]
    pub last: AttemptError,
}

/// Bounded-retry delivery around a single-attempt transport.
///
/// Each attempt is capped by the policy timeout and no more than
/// `max_attempts` attempts are made per record.
#[derive(Debug, Clone)]
pub struct RemoteDelivery<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: RecordTransport> RemoteDelivery<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn attempt(&self, record: &LogRecord) -> Result<(), AttemptError> {
        let per_attempt = self.policy.timeout();
        match timeout(per_attempt, self.transport.transmit(record)).await {
            Ok(result) => result,
            Err(_) => Err(AttemptError::Timeout(per_attempt)),
        }
    }
}

impl<T: RecordTransport> RemoteSink for RemoteDelivery<T> {
    async fn send(&self, record: &LogRecord) -> Result<u32, RemoteDeliveryError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.attempt(record).await {
                Ok(()) => {
                    debug!("Remote delivery succeeded on attempt {attempt}/{max_attempts}");
                    return Ok(attempt);
                }
                Err(e) => e,
            };

            if attempt >= max_attempts {
                warn!("Remote delivery exhausted {attempt} attempt(s): {error}");
                return Err(RemoteDeliveryError {
                    attempts: attempt,
                    last: error,
                });
            }

            let delay = self.policy.backoff().calculate_delay(attempt - 1);
            debug!(
                "Remote attempt {attempt}/{max_attempts} failed: {error}; retrying in {delay:?}"
            );
            if !delay.is_zero() {
                sleep(delay).await;
            }
        }
    }
}

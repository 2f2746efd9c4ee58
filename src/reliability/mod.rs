pub mod disk;
pub mod metrics;
pub mod retry;

pub use disk::{DiskConfig, DiskFallback, FALLBACK_FILE_NAME, LocalPersistenceError, LocalSink};
pub use metrics::{DeliveryStats, MetricsSnapshot};
pub use retry::{BackoffConfig, RetryError, RetryPolicy, RetryStrategy};

use crate::domain::{LogRecord, Payload, RecordFactory, Severity, ValidationError};
use crate::sender::{HttpRemoteSink, RemoteDeliveryError, RemoteSink};
use thiserror::Error;
use tracing::{error, info, warn};

/// How a submission was resolved.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// Accepted by the remote collector.
    Delivered { attempts: u32 },
    /// Remote delivery failed and the record went to the fallback file instead.
    DegradedDelivered { remote_error: RemoteDeliveryError },
}

impl DeliveryOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, DeliveryOutcome::DegradedDelivered { .. })
    }
}

/// Both sinks failed; the record is lost.
#[derive(Error, Debug)]
#[error("logging unavailable: {remote}; local fallback also failed: {local}")]
pub struct LoggingUnavailableError {
    remote: RemoteDeliveryError,
    #[source]
    local: LocalPersistenceError,
}

impl LoggingUnavailableError {
    pub fn remote_cause(&self) -> &RemoteDeliveryError {
        &self.remote
    }

    pub fn local_cause(&self) -> &LocalPersistenceError {
        &self.local
    }

    pub fn into_causes(self) -> (RemoteDeliveryError, LocalPersistenceError) {
        (self.remote, self.local)
    }
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Unavailable(#[from] LoggingUnavailableError),
}

/// Routes each record to the remote sink and falls back to the local sink.
///
/// Submissions are independent: nothing is queued or retried across calls, and
/// the remote sink is never retried once a record has fallen back.
pub struct DeliveryOrchestrator<R, L> {
    remote: R,
    local: L,
    factory: RecordFactory,
    stats: DeliveryStats,
}

/// Orchestrator wired to the HTTP collector and the fallback file.
pub type HttpDeliveryOrchestrator = DeliveryOrchestrator<HttpRemoteSink, DiskFallback>;

impl<R: RemoteSink, L: LocalSink> DeliveryOrchestrator<R, L> {
    pub fn new(remote: R, local: L, factory: RecordFactory) -> Self {
        Self {
            remote,
            local,
            factory,
            stats: DeliveryStats::new(),
        }
    }

    pub async fn submit(
        &self,
        record: LogRecord,
    ) -> Result<DeliveryOutcome, LoggingUnavailableError> {
        let remote_error = match self.remote.send(&record).await {
            Ok(attempts) => {
                self.stats.record_delivered(attempts);
                return Ok(DeliveryOutcome::Delivered { attempts });
            }
            Err(e) => e,
        };

        warn!(
            "Falling back to local storage for {} record: {}",
            record.severity(),
            remote_error
        );

        match self.local.save(&record).await {
            Ok(()) => {
                self.stats.record_degraded(remote_error.attempts);
                info!("Record persisted to local fallback");
                Ok(DeliveryOutcome::DegradedDelivered { remote_error })
            }
            Err(local_error) => {
                self.stats.record_failed(remote_error.attempts);
                error!(
                    "Logging unavailable, record dropped: remote: {}; local: {}",
                    remote_error, local_error
                );
                Err(LoggingUnavailableError {
                    remote: remote_error,
                    local: local_error,
                })
            }
        }
    }

    /// Builds a record stamped with this orchestrator's source and submits it.
    pub async fn log(
        &self,
        severity: Severity,
        message: impl Into<String>,
        payload: Option<Payload>,
    ) -> Result<DeliveryOutcome, SubmitError> {
        let record = self.factory.build(severity, message, payload)?;
        Ok(self.submit(record).await?)
    }

    pub async fn debug(&self, message: impl Into<String>) -> Result<DeliveryOutcome, SubmitError> {
        self.log(Severity::Debug, message, None).await
    }

    pub async fn info(&self, message: impl Into<String>) -> Result<DeliveryOutcome, SubmitError> {
        self.log(Severity::Info, message, None).await
    }

    pub async fn warn(&self, message: impl Into<String>) -> Result<DeliveryOutcome, SubmitError> {
        self.log(Severity::Warn, message, None).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Result<DeliveryOutcome, SubmitError> {
        self.log(Severity::Error, message, None).await
    }

    pub fn factory(&self) -> &RecordFactory {
        &self.factory
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn stats(&self) -> MetricsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::AttemptError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedRemote {
        ok: bool,
        calls: AtomicUsize,
    }

    impl RemoteSink for FixedRemote {
        async fn send(&self, _record: &LogRecord) -> Result<u32, RemoteDeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.ok {
                Ok(1)
            } else {
                Err(RemoteDeliveryError {
                    attempts: 2,
                    last: AttemptError::Status { status: 503 },
                })
            }
        }
    }

    struct FixedLocal {
        ok: bool,
        calls: AtomicUsize,
    }

    impl LocalSink for FixedLocal {
        async fn save(&self, _record: &LogRecord) -> Result<(), LocalPersistenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.ok {
                Ok(())
            } else {
                Err(LocalPersistenceError::CapacityExceeded {
                    path: "fallback-logs.json".into(),
                    limit: 0,
                })
            }
        }
    }

    fn orchestrator(remote_ok: bool, local_ok: bool) -> DeliveryOrchestrator<FixedRemote, FixedLocal> {
        DeliveryOrchestrator::new(
            FixedRemote {
                ok: remote_ok,
                calls: AtomicUsize::new(0),
            },
            FixedLocal {
                ok: local_ok,
                calls: AtomicUsize::new(0),
            },
            RecordFactory::new("unit"),
        )
    }

    #[tokio::test]
    async fn test_remote_success_skips_local() {
        let orchestrator = orchestrator(true, true);
        let outcome = orchestrator.info("hello").await.unwrap();

        assert!(matches!(outcome, DeliveryOutcome::Delivered { attempts: 1 }));
        assert_eq!(orchestrator.local().calls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.stats().delivered, 1);
    }

    #[tokio::test]
    async fn test_remote_failure_is_degraded() {
        let orchestrator = orchestrator(false, true);
        let outcome = orchestrator.warn("hello").await.unwrap();

        assert!(outcome.is_degraded());
        assert_eq!(orchestrator.remote().calls.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.local().calls.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.stats().degraded, 1);
        assert_eq!(orchestrator.stats().remote_attempts, 2);
    }

    #[tokio::test]
    async fn test_both_failing_is_unavailable() {
        let orchestrator = orchestrator(false, false);
        let err = orchestrator.error("hello").await.unwrap_err();

        let err = match err {
            SubmitError::Unavailable(err) => err,
            other => panic!("expected Unavailable, got {other:?}"),
        };
        assert!(matches!(
            err.remote_cause().last,
            AttemptError::Status { status: 503 }
        ));
        assert!(matches!(
            err.local_cause(),
            LocalPersistenceError::CapacityExceeded { .. }
        ));
        // Remote is not retried after the fallback fails.
        assert_eq!(orchestrator.remote().calls.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_validation_error_skips_both_sinks() {
        let orchestrator = orchestrator(true, true);
        let err = orchestrator.debug("").await.unwrap_err();

        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::EmptyMessage)
        ));
        assert_eq!(orchestrator.remote().calls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.local().calls.load(Ordering::SeqCst), 0);
    }
}

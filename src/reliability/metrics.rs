use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub delivered: u64,
    pub degraded: u64,
    pub failed: u64,
    pub remote_attempts: u64,
}

impl MetricsSnapshot {
    pub fn total_submissions(&self) -> u64 {
        self.delivered + self.degraded + self.failed
    }
}

/// Outcome counters for one orchestrator.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    degraded: AtomicU64,
    failed: AtomicU64,
    remote_attempts: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_delivered(&self, attempts: u32) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.remote_attempts
            .fetch_add(attempts as u64, Ordering::Relaxed);
    }

    pub fn record_degraded(&self, attempts: u32) {
        self.degraded.fetch_add(1, Ordering::Relaxed);
        self.remote_attempts
            .fetch_add(attempts as u64, Ordering::Relaxed);
    }

    pub fn record_failed(&self, attempts: u32) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.remote_attempts
            .fetch_add(attempts as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            remote_attempts: self.remote_attempts.load(Ordering::Relaxed),
        }
    }
}

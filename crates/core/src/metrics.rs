//! MetricsSink (§4.6, Component G) - per-partition counters labeled by event
//! kind, incremented on successful transition only (never on no-op deletes).

use std::sync::atomic::{AtomicU64, Ordering};

pub trait MetricsSink: Send + Sync {
    fn inc_created(&self);
    fn inc_activated(&self);
    fn inc_timed_out(&self);
    fn inc_completed(&self);
    fn inc_failed(&self);
}

/// Snapshot of counter values, for tests and for exporting to an external
/// metrics sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub created: u64,
    pub activated: u64,
    pub timed_out: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Lock-free in-process counters, one `AtomicU64` per event kind.
#[derive(Default)]
pub struct AtomicMetricsSink {
    created: AtomicU64,
    activated: AtomicU64,
    timed_out: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl AtomicMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            created: self.created.load(Ordering::Relaxed),
            activated: self.activated.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSink for AtomicMetricsSink {
    fn inc_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_activated(&self) {
        self.activated.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Discards every increment - the default when no metrics sink is wired up.
#[derive(Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn inc_created(&self) {}
    fn inc_activated(&self) {}
    fn inc_timed_out(&self) {}
    fn inc_completed(&self) {}
    fn inc_failed(&self) {}
}

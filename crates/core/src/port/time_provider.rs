// Time Provider Port (for deterministic tests)
//
// JobStateCore itself never reads the clock - every operation takes `now`/
// `upperBound` as an explicit argument (§4.4). This port exists for callers
// (the daemon, integration tests) that need a single source of "now" to
// drive those arguments, the way the teacher's worker/scheduler code does.

/// Time provider interface (allows mocking in tests).
pub trait TimeProvider: Send + Sync {
    /// Current time in milliseconds since the epoch.
    fn now_millis(&self) -> u64;
}

/// Wall-clock time provider (production).
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Fixed-clock provider for deterministic tests.
pub struct FixedTimeProvider(pub std::sync::atomic::AtomicU64);

impl FixedTimeProvider {
    pub fn new(now_millis: u64) -> Self {
        Self(std::sync::atomic::AtomicU64::new(now_millis))
    }

    pub fn set(&self, now_millis: u64) {
        self.0.store(now_millis, std::sync::atomic::Ordering::SeqCst);
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now_millis(&self) -> u64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

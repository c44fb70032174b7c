/// Injectable wall clock. All time-window logic reads through this so tests
/// can advance virtual time instead of sleeping on real timers.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Production clock backed by `chrono`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-advanced clock for tests.
#[cfg(test)]
pub struct ManualClock {
    now: std::sync::atomic::AtomicI64,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start_ms: i64) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            now: std::sync::atomic::AtomicI64::new(start_ms),
        })
    }

    pub fn advance(&self, ms: i64) {
        let _ = self
            .now
            .fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}

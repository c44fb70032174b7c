#![allow(dead_code)]

//! Scheduled-sweep tasks with guaranteed teardown.
//!
//! Components own a `Sweeper` instead of spawning bare interval timers, so a
//! registry `destroy()` (or a plain drop) cannot leak timers across tests or
//! component rebuilds.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

pub struct Sweeper {
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Sweeper {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawns a periodic task. The first tick fires one full period after the
    /// spawn; missed ticks are skipped rather than bursted.
    pub fn spawn<F, Fut>(&self, name: &'static str, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let _ = interval.tick().await;
                trace!(task = name, "sweep tick");
                tick().await;
            }
        });
        self.tasks.lock().push(handle);
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Aborts every scheduled task. Idempotent.
    pub fn shutdown(&self) {
        for handle in self.tasks.lock().drain(..) {
            handle.abort();
        }
    }
}

impl Default for Sweeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_tick_runs_on_interval() {
        let sweeper = Sweeper::new();
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = ticks.clone();
        sweeper.spawn("test-sweep", Duration::from_secs(10), move || {
            let counter = counter.clone();
            async move {
                let _ = counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let sweeper = Sweeper::new();
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = ticks.clone();
        sweeper.spawn("test-sweep", Duration::from_secs(10), move || {
            let counter = counter.clone();
            async move {
                let _ = counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        sweeper.shutdown();
        assert_eq!(sweeper.task_count(), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent() {
        let sweeper = Sweeper::new();
        sweeper.spawn("test-sweep", Duration::from_secs(10), || async {});
        sweeper.shutdown();
        sweeper.shutdown();
        assert_eq!(sweeper.task_count(), 0);
    }
}

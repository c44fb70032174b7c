#![allow(dead_code)]

//! Fixed-window-with-reset rate limiting keyed by `principal:endpoint`.
//!
//! The counter is replaced wholesale when the window boundary passes, rather
//! than keeping a rolling log of timestamps. A caller can therefore issue up
//! to `2 × max_requests` across a boundary; that burstiness is the accepted
//! price of O(1) space and update cost per key. A background sweep deletes
//! lapsed entries so the map stays bounded.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::format_retry_after;
use crate::guard::clock::Clock;
use crate::guard::sanitize::safe_key_component;
use crate::guard::sweeper::Sweeper;
use crate::notify::{Notice, NotificationBridge};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window_ms: i64,
    pub max_requests: u32,
}

/// The guarded endpoints, each with its own window configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Upload,
    Analyze,
    Edit,
    Download,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Upload => "UPLOAD",
            Endpoint::Analyze => "ANALYZE",
            Endpoint::Edit => "EDIT",
            Endpoint::Download => "DOWNLOAD",
        }
    }

    pub fn limit(self) -> RateLimitConfig {
        match self {
            Endpoint::Upload => RateLimitConfig {
                window_ms: 60_000,
                max_requests: 5,
            },
            Endpoint::Analyze => RateLimitConfig {
                window_ms: 60_000,
                max_requests: 10,
            },
            Endpoint::Edit => RateLimitConfig {
                window_ms: 60_000,
                max_requests: 20,
            },
            Endpoint::Download => RateLimitConfig {
                window_ms: 60_000,
                max_requests: 10,
            },
        }
    }
}

/// Outcome of a limit check. Exceeding the limit is a normal return value,
/// not an error; callers decide whether to surface it as one.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<Duration>,
}

struct RateLimitEntry {
    count: u32,
    window_start: i64,
    reset_at: i64,
}

pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationBridge>,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    sweeper: Sweeper,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>, notifier: Arc<dyn NotificationBridge>) -> Self {
        Self {
            clock,
            notifier,
            entries: Mutex::new(HashMap::new()),
            sweeper: Sweeper::new(),
        }
    }

    /// Builds the canonical `principal:endpoint` key. Both components pass
    /// through [`safe_key_component`] first.
    pub fn key_for(principal: &str, endpoint: Endpoint) -> String {
        format!(
            "{}:{}",
            safe_key_component(principal),
            safe_key_component(endpoint.as_str())
        )
    }

    /// Checks and consumes one request against the window for `key`.
    pub fn check(&self, key: &str, config: &RateLimitConfig) -> Decision {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_start: now,
                reset_at: now + config.window_ms,
            });

        if now >= entry.reset_at {
            // Window lapsed: replace wholesale.
            *entry = RateLimitEntry {
                count: 0,
                window_start: now,
                reset_at: now + config.window_ms,
            };
        }

        if entry.count < config.max_requests {
            entry.count += 1;
            Decision {
                allowed: true,
                remaining: config.max_requests - entry.count,
                reset_at: entry.reset_at,
                retry_after: None,
            }
        } else {
            Decision {
                allowed: false,
                remaining: 0,
                reset_at: entry.reset_at,
                retry_after: Some(Duration::from_millis((entry.reset_at - now).max(0) as u64)),
            }
        }
    }

    /// Convenience wrapper applying the built-in per-endpoint config. Blocked
    /// requests are reported to the notification bridge.
    pub fn check_endpoint(&self, principal: &str, endpoint: Endpoint) -> Decision {
        let decision = self.check(&Self::key_for(principal, endpoint), &endpoint.limit());
        if !decision.allowed {
            let retry_after = decision.retry_after.unwrap_or_default();
            self.notifier.publish(Notice::warning(
                "Rate limit reached",
                format!(
                    "Too many {} requests. Try again in {}",
                    endpoint.as_str().to_lowercase(),
                    format_retry_after(retry_after)
                ),
            ));
        }
        decision
    }

    /// Deletes entries whose window has fully lapsed. Returns how many were
    /// removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.reset_at);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Rate limiter sweep removed {removed} lapsed entries");
        }
        removed
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Starts the background sweep. The task holds only a weak reference, so
    /// dropping the limiter (or calling [`RateLimiter::destroy`]) stops it.
    pub fn start_sweep(self: &Arc<Self>) {
        let weak: Weak<RateLimiter> = Arc::downgrade(self);
        self.sweeper.spawn("rate-limit-sweep", SWEEP_INTERVAL, move || {
            let weak = weak.clone();
            async move {
                if let Some(limiter) = weak.upgrade() {
                    let _ = limiter.sweep();
                }
            }
        });
        info!("Rate limiter sweep scheduled every {}s", SWEEP_INTERVAL.as_secs());
    }

    pub fn destroy(&self) {
        self.sweeper.shutdown();
    }
}

#![allow(dead_code)]

//! Notification bridge — the sink for human-readable guard events.
//!
//! The rate limiter, retry engine, and session registry all report here.
//! Rendering (toasts, banners) is a collaborator concern; the in-process
//! implementation logs through `tracing`.

use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Receives guard events for display to the user.
/// Carried in `AppState` as `Arc<dyn NotificationBridge>`.
pub trait NotificationBridge: Send + Sync {
    fn publish(&self, notice: Notice);
}

/// Default bridge: structured log lines. A UI-facing bridge replaces this
/// at the integration boundary.
pub struct TracingNotifier;

impl NotificationBridge for TracingNotifier {
    fn publish(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(title = %notice.title, "{}", notice.message),
            NoticeLevel::Warning => warn!(title = %notice.title, "{}", notice.message),
            NoticeLevel::Error => error!(title = %notice.title, "{}", notice.message),
        }
    }
}

/// Test double that records every published notice.
#[cfg(test)]
pub struct RecordingNotifier {
    pub notices: parking_lot::Mutex<Vec<Notice>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            notices: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.notices.lock().iter().map(|n| n.title.clone()).collect()
    }
}

#[cfg(test)]
impl NotificationBridge for RecordingNotifier {
    fn publish(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

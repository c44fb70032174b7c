use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use crate::analysis::AnalysisBackend;
use crate::config::Config;
use crate::guard::rate_limit::RateLimiter;
use crate::guard::retry::RetryPolicies;
use crate::notify::NotificationBridge;
use crate::session::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub s3: S3Client,
    pub config: Config,
    /// Per-endpoint fixed-window limiter; swept in the background.
    pub limiter: Arc<RateLimiter>,
    /// Session lifecycle, trust scoring, and persistence.
    pub sessions: Arc<SessionRegistry>,
    /// Per-class retry policies with notification hooks attached.
    pub retry: Arc<RetryPolicies>,
    pub notifier: Arc<dyn NotificationBridge>,
    /// Remote AI collaborator. Placeholder until integration.
    pub analysis: Arc<dyn AnalysisBackend>,
}

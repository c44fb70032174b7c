#![allow(dead_code)]

//! Classification-aware retry with capped exponential backoff and jitter.
//!
//! Transient failures are absorbed here and only surface after the attempt
//! budget is exhausted; terminal failures (validation, auth, rate-limit,
//! session-security) are never retried. The engine performs no internal
//! cancellation of an in-flight operation — only the inter-attempt sleep is
//! interruptible, by racing the returned future against a timeout or abort.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::errors::AppError;
use crate::notify::{Notice, NotificationBridge};

/// Upper bound on the uniform jitter added to every computed delay.
const JITTER_MAX_MS: u64 = 1_000;

/// Error-message fragments treated as transient for the non-network classes.
const TRANSIENT_MARKERS: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "connection",
    "unavailable",
    "temporarily",
];

pub type RetryCondition = Arc<dyn Fn(&AppError) -> bool + Send + Sync>;
pub type RetryHook = Arc<dyn Fn(u32, &AppError) + Send + Sync>;
pub type ExhaustedHook = Arc<dyn Fn(&AppError) + Send + Sync>;

/// The guarded operation classes, each with its own retry posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    Upload,
    Analysis,
    Edit,
    Download,
    Network,
}

impl OperationClass {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationClass::Upload => "upload",
            OperationClass::Analysis => "analysis",
            OperationClass::Edit => "edit",
            OperationClass::Download => "download",
            OperationClass::Network => "network",
        }
    }

    /// Whether a failure of this class is worth another attempt.
    ///
    /// The network class assumes every failure is transient. The other
    /// classes never retry typed terminal errors and otherwise look for
    /// transient markers in the message, because retrying a permanently
    /// failing call wastes the caller's quota.
    pub fn is_retryable(self, err: &AppError) -> bool {
        if self == OperationClass::Network {
            return true;
        }
        match err {
            AppError::Validation(_)
            | AppError::Unauthorized
            | AppError::NotFound(_)
            | AppError::RateLimited { .. }
            | AppError::SessionInvalid { .. }
            | AppError::RetryExhausted { .. }
            | AppError::NotImplemented => false,
            _ => {
                let message = err.to_string().to_lowercase();
                TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
            }
        }
    }
}

#[derive(Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub retry_on: RetryCondition,
    pub on_retry: Option<RetryHook>,
    pub on_exhausted: Option<ExhaustedHook>,
}

impl RetryConfig {
    /// The tuned policy for an operation class, without notification hooks.
    pub fn for_class(class: OperationClass) -> Self {
        let (max_attempts, base_ms, max_ms) = match class {
            OperationClass::Upload => (3, 2_000, 30_000),
            OperationClass::Analysis => (2, 3_000, 60_000),
            OperationClass::Edit => (3, 1_000, 10_000),
            OperationClass::Download => (3, 1_500, 15_000),
            OperationClass::Network => (3, 1_000, 10_000),
        };
        Self {
            max_attempts,
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
            backoff_multiplier: 2.0,
            retry_on: Arc::new(move |err| class.is_retryable(err)),
            on_retry: None,
            on_exhausted: None,
        }
    }

    /// Wires the retry/exhaustion hooks to the notification bridge so the
    /// user sees "retrying…" and "gave up" events for this class.
    pub fn notifying(mut self, class: OperationClass, bridge: Arc<dyn NotificationBridge>) -> Self {
        let on_retry_bridge = bridge.clone();
        self.on_retry = Some(Arc::new(move |attempt, err| {
            on_retry_bridge.publish(Notice::warning(
                "Retrying",
                format!("{} attempt {attempt} failed: {err}. Retrying", class.as_str()),
            ));
        }));
        self.on_exhausted = Some(Arc::new(move |err| {
            bridge.publish(Notice::error(
                "Operation failed",
                format!("{} failed after repeated attempts: {err}", class.as_str()),
            ));
        }));
        self
    }
}

/// The per-class policies, built once at startup and injected via `AppState`.
pub struct RetryPolicies {
    pub upload: RetryConfig,
    pub analysis: RetryConfig,
    pub edit: RetryConfig,
    pub download: RetryConfig,
    pub network: RetryConfig,
}

impl RetryPolicies {
    pub fn new(bridge: Arc<dyn NotificationBridge>) -> Self {
        let policy = |class: OperationClass| {
            RetryConfig::for_class(class).notifying(class, bridge.clone())
        };
        Self {
            upload: policy(OperationClass::Upload),
            analysis: policy(OperationClass::Analysis),
            edit: policy(OperationClass::Edit),
            download: policy(OperationClass::Download),
            network: policy(OperationClass::Network),
        }
    }
}

/// Runs `op`, retrying classified-transient failures with exponential backoff.
///
/// A failure the condition rejects is returned unchanged and the operation is
/// never re-invoked. Exhausting the attempt budget returns
/// [`AppError::RetryExhausted`] carrying the original error and the attempt
/// count under a stable code.
pub async fn retry_operation<T, F, Fut>(
    operation: &str,
    config: &RetryConfig,
    mut op: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !(config.retry_on)(&err) {
                    return Err(err);
                }
                if attempt >= config.max_attempts {
                    if let Some(hook) = &config.on_exhausted {
                        hook(&err);
                    }
                    return Err(AppError::RetryExhausted {
                        operation: operation.to_string(),
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                if let Some(hook) = &config.on_retry {
                    hook(attempt, &err);
                }
                let delay_ms = backoff_delay_ms(config, attempt) + jitter_ms();
                debug!("{operation} attempt {attempt} failed ({err}); retrying in {delay_ms}ms");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// `min(base × multiplier^(attempt−1), max)`, in milliseconds, without jitter.
fn backoff_delay_ms(config: &RetryConfig, attempt: u32) -> u64 {
    let exponent = attempt.saturating_sub(1).min(32);
    let raw = config.base_delay.as_millis() as f64
        * config.backoff_multiplier.powi(exponent as i32);
    let capped = raw.min(config.max_delay.as_millis() as f64);
    capped.max(0.0) as u64
}

fn jitter_ms() -> u64 {
    rand::thread_rng().gen_range(0..JITTER_MAX_MS)
}

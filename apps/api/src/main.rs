mod analysis;
mod config;
mod errors;
mod guard;
mod models;
mod notify;
mod routes;
mod session;
mod state;
mod store;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::{AnalysisBackend, UnconfiguredBackend};
use crate::config::Config;
use crate::guard::clock::{Clock, SystemClock};
use crate::guard::rate_limit::RateLimiter;
use crate::guard::retry::RetryPolicies;
use crate::notify::{NotificationBridge, TracingNotifier};
use crate::routes::build_router;
use crate::session::fingerprint::{EnvironmentSignalProvider, ProcessSignalProvider};
use crate::session::SessionRegistry;
use crate::state::AppState;
use crate::store::RedisStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Burnish API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Redis-backed session store
    let redis = redis::Client::open(config.redis_url.clone())?;
    let session_store = Arc::new(RedisStore::connect(&redis).await?);

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let notifier: Arc<dyn NotificationBridge> = Arc::new(TracingNotifier);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let signals: Arc<dyn EnvironmentSignalProvider> = Arc::new(ProcessSignalProvider);

    // Session registry: load persisted records, then start the cleanup sweep
    let sessions = Arc::new(SessionRegistry::new(
        session_store,
        clock.clone(),
        signals,
        notifier.clone(),
        config.session.clone(),
        &config.obfuscation_key,
    ));
    let _ = sessions.init().await?;
    sessions.start_sweeps();

    // Rate limiter with its background sweep
    let limiter = Arc::new(RateLimiter::new(clock, notifier.clone()));
    limiter.start_sweep();

    // Per-class retry policies reporting through the notification bridge
    let retry = Arc::new(RetryPolicies::new(notifier.clone()));

    // Remote AI backend is an external collaborator; placeholder until wired
    let backend: Arc<dyn AnalysisBackend> = Arc::new(UnconfiguredBackend);

    // Build app state
    let state = AppState {
        s3,
        config: config.clone(),
        limiter,
        sessions,
        retry,
        notifier,
        analysis: backend,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "burnish-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

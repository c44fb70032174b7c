#![allow(dead_code)]

//! Secure session registry — creates, validates, ages out, and limits
//! concurrent sessions, and scores identity continuity.
//!
//! Lifecycle per session: Created → Active (on any activity) → Inactive
//! (past the inactivity timeout; score-penalized but retained) →
//! Invalidated (explicit) or Expired (past max age) → Evicted (removed by
//! the cleanup sweep or the session cap). Evicted is terminal.
//!
//! The registry is an explicitly constructed object with its own lifecycle
//! (`init` / `start_sweeps` / `destroy`); nothing here is ambient state.

pub mod fingerprint;
pub mod obfuscate;

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::guard::clock::Clock;
use crate::guard::sanitize::sanitize_metadata;
use crate::guard::sweeper::Sweeper;
use crate::models::session::{SecurityReport, SessionRecord};
use crate::notify::{Notice, NotificationBridge};
use crate::session::fingerprint::{compute_fingerprint, EnvironmentSignalProvider};
use crate::store::SessionStore;

/// Store key prefix for persisted session records.
pub const STORE_PREFIX: &str = "burnish:session:";

const EXPIRED_PENALTY: i32 = 50;
const INACTIVE_PENALTY: i32 = 30;
const FINGERPRINT_PENALTY: i32 = 40;
const SIGNATURE_PENALTY: i32 = 20;
const VALID_SCORE_FLOOR: u8 = 50;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum session age before it counts as expired.
    pub max_age_ms: i64,
    /// Idle period after which a session counts as inactive.
    pub inactivity_timeout_ms: i64,
    /// Concurrent active-session cap; excess is deactivated oldest-first.
    pub max_sessions: usize,
    /// Cleanup sweep period.
    pub cleanup_interval_ms: u64,
    /// Minimum gap between store write-throughs of activity bumps.
    pub activity_throttle_ms: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_ms: 24 * 60 * 60 * 1000,
            inactivity_timeout_ms: 30 * 60 * 1000,
            max_sessions: 5,
            cleanup_interval_ms: 5 * 60 * 1000,
            activity_throttle_ms: 5_000,
        }
    }
}

pub struct SessionRegistry {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    signals: Arc<dyn EnvironmentSignalProvider>,
    notifier: Arc<dyn NotificationBridge>,
    config: SessionConfig,
    obfuscation_key: Vec<u8>,
    sessions: RwLock<HashMap<String, SessionRecord>>,
    sweeper: Sweeper,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        signals: Arc<dyn EnvironmentSignalProvider>,
        notifier: Arc<dyn NotificationBridge>,
        config: SessionConfig,
        obfuscation_key: &str,
    ) -> Self {
        Self {
            store,
            clock,
            signals,
            notifier,
            config,
            obfuscation_key: obfuscation_key.as_bytes().to_vec(),
            sessions: RwLock::new(HashMap::new()),
            sweeper: Sweeper::new(),
        }
    }

    /// Loads persisted records into memory. Corrupt payloads are dropped
    /// from the store rather than resurrected. Returns how many loaded.
    pub async fn init(&self) -> Result<usize, AppError> {
        let keys = self.store.keys(STORE_PREFIX).await?;
        let mut loaded = 0usize;
        let mut dropped = 0usize;

        for key in keys {
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            let parsed = obfuscate::deobfuscate(&raw, &self.obfuscation_key)
                .ok()
                .and_then(|json| serde_json::from_str::<SessionRecord>(&json).ok());
            match parsed {
                Some(record) => {
                    let _ = self
                        .sessions
                        .write()
                        .insert(record.session_id.clone(), record);
                    loaded += 1;
                }
                None => {
                    warn!("Dropping corrupt session record at {key}");
                    self.store.remove(&key).await?;
                    dropped += 1;
                }
            }
        }

        info!("Loaded {loaded} persisted sessions ({dropped} corrupt dropped)");
        Ok(loaded)
    }

    /// Creates and persists a new session from the current environment
    /// signals, then applies the concurrent-session cap.
    pub async fn create_session(
        &self,
        metadata: HashMap<String, String>,
    ) -> Result<SessionRecord, AppError> {
        let now = self.clock.now_ms();
        let signals = self.signals.signals();

        let record = SessionRecord {
            session_id: generate_session_id(now),
            created_at: now,
            last_activity: now,
            environment_fingerprint: compute_fingerprint(&signals),
            surface_signature: signals.surface_signature,
            is_active: true,
            metadata: sanitize_metadata(&metadata),
        };

        let _ = self
            .sessions
            .write()
            .insert(record.session_id.clone(), record.clone());
        self.persist(&record).await?;
        let _ = self.enforce_session_limits().await?;

        info!("Created session {}", record.session_id);
        Ok(record)
    }

    pub fn get_session(&self, id: &str) -> Option<SessionRecord> {
        self.sessions.read().get(id).cloned()
    }

    /// The active session with the most recent activity, if any.
    pub fn get_current_session(&self) -> Option<SessionRecord> {
        self.sessions
            .read()
            .values()
            .filter(|r| r.is_active)
            .max_by_key(|r| r.last_activity)
            .cloned()
    }

    /// Bumps `last_activity` to now and reactivates the record. The store
    /// write-through is throttled; the in-memory bump always happens.
    pub async fn update_activity(&self, id: &str) -> Result<(), AppError> {
        let now = self.clock.now_ms();
        let (record, persist) = {
            let mut sessions = self.sessions.write();
            let Some(record) = sessions.get_mut(id) else {
                return Err(AppError::NotFound(format!("Session {id} not found")));
            };
            let elapsed = now - record.last_activity;
            record.last_activity = now;
            record.is_active = true;
            (record.clone(), elapsed >= self.config.activity_throttle_ms)
        };

        if persist {
            self.persist(&record).await?;
        }
        Ok(())
    }

    /// Scores identity continuity for a session. Starts at 100 and deducts
    /// per violation; a session is valid only while the score stays above
    /// 50, it has not expired, and it has not been invalidated.
    pub fn validate_session_security(&self, id: &str) -> SecurityReport {
        let now = self.clock.now_ms();
        let current = self.signals.signals();

        let report = {
            let sessions = self.sessions.read();
            let Some(record) = sessions.get(id) else {
                return SecurityReport {
                    is_valid: false,
                    is_expired: false,
                    is_inactive: false,
                    security_score: 0,
                    warnings: vec!["session not found".to_string()],
                };
            };

            let mut score: i32 = 100;
            let mut warnings = Vec::new();

            let is_expired = now - record.created_at > self.config.max_age_ms;
            if is_expired {
                score -= EXPIRED_PENALTY;
                warnings.push("session has exceeded its maximum age".to_string());
            }

            let is_inactive = now - record.last_activity > self.config.inactivity_timeout_ms;
            if is_inactive {
                score -= INACTIVE_PENALTY;
                warnings.push("session has been inactive past the timeout".to_string());
            }

            if compute_fingerprint(&current) != record.environment_fingerprint {
                score -= FINGERPRINT_PENALTY;
                warnings.push("environment fingerprint mismatch".to_string());
            }

            if current.surface_signature != record.surface_signature {
                score -= SIGNATURE_PENALTY;
                warnings.push("surface signature changed since session creation".to_string());
            }

            if !record.is_active {
                warnings.push("session has been invalidated".to_string());
            }

            let security_score = score.clamp(0, 100) as u8;
            SecurityReport {
                is_valid: security_score > VALID_SCORE_FLOOR && !is_expired && record.is_active,
                is_expired,
                is_inactive,
                security_score,
                warnings,
            }
        };

        if !report.is_valid {
            self.notifier.publish(Notice::warning(
                "Session security",
                format!("Session {id} failed validation: {}", report.warnings.join("; ")),
            ));
        }
        report
    }

    /// Deactivates a session without deleting it; the record stays around
    /// for audit until the cleanup sweep removes it.
    pub async fn invalidate_session(&self, id: &str) -> Result<(), AppError> {
        let record = {
            let mut sessions = self.sessions.write();
            let Some(record) = sessions.get_mut(id) else {
                return Err(AppError::NotFound(format!("Session {id} not found")));
            };
            record.is_active = false;
            record.clone()
        };
        self.persist(&record).await?;
        info!("Invalidated session {id}");
        Ok(())
    }

    /// Keeps at most `max_sessions` active records, ordered by most recent
    /// activity; the rest are deactivated oldest-first. Returns how many
    /// were deactivated.
    pub async fn enforce_session_limits(&self) -> Result<usize, AppError> {
        let deactivated: Vec<SessionRecord> = {
            let mut sessions = self.sessions.write();
            let mut active: Vec<(String, i64)> = sessions
                .values()
                .filter(|r| r.is_active)
                .map(|r| (r.session_id.clone(), r.last_activity))
                .collect();
            // Most recent first; everything past the cap gets deactivated.
            active.sort_by(|a, b| b.1.cmp(&a.1));

            active
                .iter()
                .skip(self.config.max_sessions)
                .filter_map(|(id, _)| {
                    sessions.get_mut(id).map(|record| {
                        record.is_active = false;
                        record.clone()
                    })
                })
                .collect()
        };

        for record in &deactivated {
            self.persist(record).await?;
        }

        if !deactivated.is_empty() {
            self.notifier.publish(Notice::warning(
                "Session limit reached",
                format!(
                    "{} oldest session(s) were signed out to stay within the limit of {}",
                    deactivated.len(),
                    self.config.max_sessions
                ),
            ));
        }
        Ok(deactivated.len())
    }

    /// Removes records that are BOTH expired and past the inactivity
    /// timeout, from memory and the store. Idempotent. Returns how many
    /// were evicted.
    pub async fn cleanup_expired_sessions(&self) -> Result<usize, AppError> {
        let now = self.clock.now_ms();
        let evicted: Vec<String> = {
            let mut sessions = self.sessions.write();
            let ids: Vec<String> = sessions
                .values()
                .filter(|r| {
                    now - r.created_at > self.config.max_age_ms
                        && now - r.last_activity > self.config.inactivity_timeout_ms
                })
                .map(|r| r.session_id.clone())
                .collect();
            for id in &ids {
                let _ = sessions.remove(id);
            }
            ids
        };

        for id in &evicted {
            self.store.remove(&store_key(id)).await?;
        }

        if !evicted.is_empty() {
            debug!("Cleanup evicted {} session(s)", evicted.len());
        }
        Ok(evicted.len())
    }

    /// Starts the periodic cleanup sweep. The task holds only a weak
    /// reference; dropping the registry or calling `destroy` stops it.
    pub fn start_sweeps(self: &Arc<Self>) {
        let weak: Weak<SessionRegistry> = Arc::downgrade(self);
        let period = Duration::from_millis(self.config.cleanup_interval_ms);
        self.sweeper.spawn("session-cleanup", period, move || {
            let weak = weak.clone();
            async move {
                if let Some(registry) = weak.upgrade() {
                    if let Err(e) = registry.cleanup_expired_sessions().await {
                        warn!("Session cleanup sweep failed: {e}");
                    }
                }
            }
        });
        info!(
            "Session cleanup scheduled every {}ms",
            self.config.cleanup_interval_ms
        );
    }

    /// Tears down the sweep tasks.
    pub fn destroy(&self) {
        self.sweeper.shutdown();
        info!("Session registry destroyed");
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().values().filter(|r| r.is_active).count()
    }

    async fn persist(&self, record: &SessionRecord) -> Result<(), AppError> {
        let json = serde_json::to_string(record)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("serialize session: {e}")))?;
        let payload = obfuscate::obfuscate(&json, &self.obfuscation_key);
        self.store
            .set(&store_key(&record.session_id), &payload)
            .await
    }
}

fn store_key(id: &str) -> String {
    format!("{STORE_PREFIX}{id}")
}

/// Session id: creation timestamp plus 16 cryptographically random bytes.
fn generate_session_id(now_ms: i64) -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    format!("sess_{:x}_{}", now_ms, fingerprint::hex_encode(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::clock::ManualClock;
    use crate::notify::RecordingNotifier;
    use crate::session::fingerprint::{test_signals, StaticSignalProvider};
    use crate::store::MemoryStore;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    const HALF_HOUR_MS: i64 = 30 * 60 * 1000;

    struct Harness {
        clock: Arc<ManualClock>,
        signals: Arc<StaticSignalProvider>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        registry: SessionRegistry,
    }

    fn harness() -> Harness {
        let clock = ManualClock::new(1_000_000);
        let signals = Arc::new(StaticSignalProvider::new(test_signals()));
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let registry = SessionRegistry::new(
            store.clone(),
            clock.clone(),
            signals.clone(),
            notifier.clone(),
            SessionConfig::default(),
            "test-obfuscation-key",
        );
        Harness {
            clock,
            signals,
            store,
            notifier,
            registry,
        }
    }

    #[tokio::test]
    async fn test_create_session_persists_and_activates() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();

        assert!(record.session_id.starts_with("sess_"));
        assert!(record.is_active);
        assert_eq!(record.created_at, record.last_activity);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let h = harness();
        let a = h.registry.create_session(HashMap::new()).await.unwrap();
        let b = h.registry.create_session(HashMap::new()).await.unwrap();
        assert_ne!(a.session_id, b.session_id);
    }

    #[tokio::test]
    async fn test_create_session_sanitizes_metadata() {
        let h = harness();
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), "<script>web</script>".to_string());
        let record = h.registry.create_session(metadata).await.unwrap();
        assert_eq!(record.metadata.get("source").map(String::as_str), Some("web"));
    }

    #[tokio::test]
    async fn test_get_current_session_prefers_most_recent_activity() {
        let h = harness();
        let first = h.registry.create_session(HashMap::new()).await.unwrap();
        h.clock.advance(10_000);
        let second = h.registry.create_session(HashMap::new()).await.unwrap();

        assert_eq!(
            h.registry.get_current_session().unwrap().session_id,
            second.session_id
        );

        h.clock.advance(10_000);
        h.registry.update_activity(&first.session_id).await.unwrap();
        assert_eq!(
            h.registry.get_current_session().unwrap().session_id,
            first.session_id
        );
    }

    #[tokio::test]
    async fn test_fresh_session_scores_perfect() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();
        let report = h.registry.validate_session_security(&record.session_id);

        assert!(report.is_valid);
        assert!(!report.is_expired);
        assert!(!report.is_inactive);
        assert_eq!(report.security_score, 100);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_is_invalid() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();
        h.clock.advance(DAY_MS + 1);

        let report = h.registry.validate_session_security(&record.session_id);
        assert!(report.is_expired);
        assert!(!report.is_valid);
        // Expired + inactive: 100 − 50 − 30.
        assert_eq!(report.security_score, 20);
    }

    #[tokio::test]
    async fn test_inactive_session_penalized_but_valid() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();
        h.clock.advance(HALF_HOUR_MS + 1);

        let report = h.registry.validate_session_security(&record.session_id);
        assert!(report.is_inactive);
        assert!(!report.is_expired);
        assert_eq!(report.security_score, 70);
        assert!(report.is_valid);
    }

    #[tokio::test]
    async fn test_changed_surface_signature_invalidates() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();

        let mut drifted = test_signals();
        drifted.surface_signature = "macos/aarch64/unix".to_string();
        h.signals.set(drifted);

        let report = h.registry.validate_session_security(&record.session_id);
        // Fingerprint (−40) and signature (−20) both fire.
        assert_eq!(report.security_score, 40);
        assert!(report.security_score <= 60);
        assert!(!report.is_valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("fingerprint mismatch")));
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("surface signature changed")));
    }

    #[tokio::test]
    async fn test_locale_drift_alone_keeps_session_valid() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();

        let mut drifted = test_signals();
        drifted.locale = "de-DE".to_string();
        h.signals.set(drifted);

        let report = h.registry.validate_session_security(&record.session_id);
        assert_eq!(report.security_score, 60);
        assert!(report.is_valid);
    }

    #[tokio::test]
    async fn test_score_never_increases_with_more_violations() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();

        let baseline = h.registry.validate_session_security(&record.session_id);

        h.clock.advance(HALF_HOUR_MS + 1);
        let inactive = h.registry.validate_session_security(&record.session_id);
        assert!(inactive.security_score <= baseline.security_score);

        let mut drifted = test_signals();
        drifted.surface_signature = "drifted".to_string();
        h.signals.set(drifted);
        let drifted_too = h.registry.validate_session_security(&record.session_id);
        assert!(drifted_too.security_score <= inactive.security_score);

        h.clock.advance(DAY_MS);
        let everything = h.registry.validate_session_security(&record.session_id);
        assert!(everything.security_score <= drifted_too.security_score);
        assert_eq!(everything.security_score, 0);
    }

    #[tokio::test]
    async fn test_unknown_session_scores_zero() {
        let h = harness();
        let report = h.registry.validate_session_security("nope");
        assert!(!report.is_valid);
        assert_eq!(report.security_score, 0);
        assert_eq!(report.warnings, vec!["session not found".to_string()]);
    }

    #[tokio::test]
    async fn test_invalidated_session_fails_validation_but_is_retained() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();
        h.registry
            .invalidate_session(&record.session_id)
            .await
            .unwrap();

        let report = h.registry.validate_session_security(&record.session_id);
        assert!(!report.is_valid);
        assert_eq!(report.security_score, 100);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("invalidated")));
        // Retained for audit until the sweep.
        assert_eq!(h.registry.session_count(), 1);
    }

    #[tokio::test]
    async fn test_session_cap_deactivates_oldest() {
        let h = harness();
        let mut ids = Vec::new();
        for _ in 0..6 {
            let record = h.registry.create_session(HashMap::new()).await.unwrap();
            ids.push(record.session_id);
            h.clock.advance(1_000);
        }

        assert_eq!(h.registry.active_count(), 5);
        assert_eq!(h.registry.session_count(), 6);
        // Exactly the oldest-by-activity record lost its slot.
        assert!(!h.registry.get_session(&ids[0]).unwrap().is_active);
        for id in &ids[1..] {
            assert!(h.registry.get_session(id).unwrap().is_active);
        }
        assert!(h
            .notifier
            .titles()
            .contains(&"Session limit reached".to_string()));
    }

    #[tokio::test]
    async fn test_enforce_is_noop_under_cap() {
        let h = harness();
        let _ = h.registry.create_session(HashMap::new()).await.unwrap();
        let deactivated = h.registry.enforce_session_limits().await.unwrap();
        assert_eq!(deactivated, 0);
        assert_eq!(h.registry.active_count(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_requires_expired_and_inactive() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();

        // Expired by age but recently active: kept.
        h.clock.advance(DAY_MS + 1);
        h.registry.update_activity(&record.session_id).await.unwrap();
        assert_eq!(h.registry.cleanup_expired_sessions().await.unwrap(), 0);
        assert_eq!(h.registry.session_count(), 1);

        // Now also inactive: evicted from memory and store.
        h.clock.advance(HALF_HOUR_MS + 1);
        assert_eq!(h.registry.cleanup_expired_sessions().await.unwrap(), 1);
        assert_eq!(h.registry.session_count(), 0);
        assert_eq!(h.store.len(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let h = harness();
        let _ = h.registry.create_session(HashMap::new()).await.unwrap();
        h.clock.advance(DAY_MS + HALF_HOUR_MS + 2);

        assert_eq!(h.registry.cleanup_expired_sessions().await.unwrap(), 1);
        assert_eq!(h.registry.cleanup_expired_sessions().await.unwrap(), 0);
        assert_eq!(h.registry.session_count(), 0);
    }

    #[tokio::test]
    async fn test_evicted_session_is_not_resurrected() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();
        h.clock.advance(DAY_MS + HALF_HOUR_MS + 2);
        let _ = h.registry.cleanup_expired_sessions().await.unwrap();

        assert!(h.registry.get_session(&record.session_id).is_none());
        assert!(matches!(
            h.registry.update_activity(&record.session_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_activity_write_through_is_throttled() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();

        // Inside the throttle window: memory bumps, store does not.
        h.clock.advance(1_000);
        h.registry.update_activity(&record.session_id).await.unwrap();
        let in_memory = h.registry.get_session(&record.session_id).unwrap();
        assert_eq!(in_memory.last_activity, record.last_activity + 1_000);

        let persisted = h
            .store
            .get(&store_key(&record.session_id))
            .await
            .unwrap()
            .unwrap();
        let json = obfuscate::deobfuscate(&persisted, b"test-obfuscation-key").unwrap();
        let stored: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(stored.last_activity, record.last_activity);

        // Past the throttle window: write-through happens.
        h.clock.advance(6_000);
        h.registry.update_activity(&record.session_id).await.unwrap();
        let persisted = h
            .store
            .get(&store_key(&record.session_id))
            .await
            .unwrap()
            .unwrap();
        let json = obfuscate::deobfuscate(&persisted, b"test-obfuscation-key").unwrap();
        let stored: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(stored.last_activity, record.last_activity + 7_000);
    }

    #[tokio::test]
    async fn test_init_reloads_persisted_sessions() {
        let h = harness();
        let record = h.registry.create_session(HashMap::new()).await.unwrap();

        let reloaded = SessionRegistry::new(
            h.store.clone(),
            h.clock.clone(),
            h.signals.clone(),
            Arc::new(RecordingNotifier::new()),
            SessionConfig::default(),
            "test-obfuscation-key",
        );
        assert_eq!(reloaded.init().await.unwrap(), 1);
        assert_eq!(
            reloaded.get_session(&record.session_id).unwrap().session_id,
            record.session_id
        );
    }

    #[tokio::test]
    async fn test_init_drops_corrupt_records() {
        let h = harness();
        h.store
            .set(&store_key("sess_bad"), "not-a-valid-payload")
            .await
            .unwrap();

        assert_eq!(h.registry.init().await.unwrap(), 0);
        assert_eq!(h.store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_lifecycle() {
        let h = harness();
        let registry = Arc::new(h.registry);
        let _ = registry.create_session(HashMap::new()).await.unwrap();
        h.clock.advance(DAY_MS + HALF_HOUR_MS + 2);

        registry.start_sweeps();
        tokio::time::sleep(Duration::from_millis(
            SessionConfig::default().cleanup_interval_ms + 100,
        ))
        .await;
        assert_eq!(registry.session_count(), 0);

        registry.destroy();
        assert_eq!(registry.sweeper.task_count(), 0);
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A tracked session. The persisted form is this record serialized to JSON,
/// obfuscated, and stored under `burnish:session:<session_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds; bumped on every tracked action.
    pub last_activity: i64,
    /// Hash over the environment signal set at creation time.
    pub environment_fingerprint: String,
    /// The raw surface signature at creation time, kept alongside the
    /// fingerprint so signature drift can be scored separately.
    pub surface_signature: String,
    pub is_active: bool,
    pub metadata: HashMap<String, String>,
}

/// Result of a session security validation pass. Derived on demand, never
/// stored.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityReport {
    pub is_valid: bool,
    pub is_expired: bool,
    pub is_inactive: bool,
    /// Heuristic trust metric, 0–100.
    pub security_score: u8,
    pub warnings: Vec<String>,
}

//! Environment fingerprinting — a weak, non-cryptographic identity-continuity
//! check. The signal set is deliberately abstract: a browser client hashes
//! locale/viewport/canvas signals, a server process hashes its own stable
//! attributes. The registry's scoring logic is identical either way.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable signals describing the environment a session was created in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSignals {
    pub locale: String,
    pub display: String,
    pub hardware_concurrency: u32,
    pub surface_signature: String,
}

/// Supplies the current environment signals. Injected into the session
/// registry so non-browser targets can provide an analogous signal set.
pub trait EnvironmentSignalProvider: Send + Sync {
    fn signals(&self) -> EnvironmentSignals;
}

/// Default provider: derives signals from process attributes.
pub struct ProcessSignalProvider;

impl EnvironmentSignalProvider for ProcessSignalProvider {
    fn signals(&self) -> EnvironmentSignals {
        let locale = std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_else(|_| "en-US".to_string());
        let display = match (std::env::var("COLUMNS"), std::env::var("LINES")) {
            (Ok(cols), Ok(lines)) => format!("{cols}x{lines}"),
            _ => "headless".to_string(),
        };
        let hardware_concurrency = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
        let surface_signature = format!(
            "{}/{}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH,
            std::env::consts::FAMILY
        );
        EnvironmentSignals {
            locale,
            display,
            hardware_concurrency,
            surface_signature,
        }
    }
}

/// SHA-256 over the full signal set, hex-encoded.
pub fn compute_fingerprint(signals: &EnvironmentSignals) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signals.locale.as_bytes());
    hasher.update(b"|");
    hasher.update(signals.display.as_bytes());
    hasher.update(b"|");
    hasher.update(signals.hardware_concurrency.to_le_bytes());
    hasher.update(b"|");
    hasher.update(signals.surface_signature.as_bytes());
    hex_encode(hasher.finalize().as_slice())
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Mutable provider for tests: simulates environment drift between session
/// creation and validation.
#[cfg(test)]
pub struct StaticSignalProvider {
    signals: parking_lot::Mutex<EnvironmentSignals>,
}

#[cfg(test)]
impl StaticSignalProvider {
    pub fn new(signals: EnvironmentSignals) -> Self {
        Self {
            signals: parking_lot::Mutex::new(signals),
        }
    }

    pub fn set(&self, signals: EnvironmentSignals) {
        *self.signals.lock() = signals;
    }
}

#[cfg(test)]
impl EnvironmentSignalProvider for StaticSignalProvider {
    fn signals(&self) -> EnvironmentSignals {
        self.signals.lock().clone()
    }
}

#[cfg(test)]
pub fn test_signals() -> EnvironmentSignals {
    EnvironmentSignals {
        locale: "en-US".to_string(),
        display: "1920x1080".to_string(),
        hardware_concurrency: 8,
        surface_signature: "linux/x86_64/unix".to_string(),
    }
}

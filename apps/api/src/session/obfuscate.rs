//! XOR-and-base64 obfuscation of persisted session payloads.
//!
//! This is deliberately obfuscation, NOT confidentiality: it keeps session
//! records from being casually readable in a store browser, and nothing
//! more. Callers must not treat the output as encrypted.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObfuscateError {
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// XORs `plaintext` with the cycled key and base64-encodes the result.
/// An empty key passes the payload through unobfuscated.
pub fn obfuscate(plaintext: &str, key: &[u8]) -> String {
    BASE64.encode(xor_cycle(plaintext.as_bytes(), key))
}

/// Reverses [`obfuscate`]. Fails on malformed base64 or a payload that does
/// not decode to UTF-8 (a wrong key or corrupt record).
pub fn deobfuscate(encoded: &str, key: &[u8]) -> Result<String, ObfuscateError> {
    let raw = BASE64.decode(encoded)?;
    Ok(String::from_utf8(xor_cycle(&raw, key))?)
}

fn xor_cycle(data: &[u8], key: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return data.to_vec();
    }
    data.iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect()
}

#![allow(dead_code)]

//! Input sanitization shared by the rate limiter, session registry, and
//! upload handling. Malformed input is rejected or normalized here, before
//! it reaches a counter key, a stored record, or an S3 object key.

use std::collections::HashMap;

use crate::errors::AppError;

pub const MAX_KEY_COMPONENT_LEN: usize = 64;
pub const MAX_FILENAME_LEN: usize = 128;
pub const MAX_METADATA_ENTRIES: usize = 16;
pub const MAX_METADATA_KEY_LEN: usize = 32;
pub const MAX_METADATA_VALUE_LEN: usize = 256;
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "md"];

/// Restricts a rate-limit or store key component to `[A-Za-z0-9_-]`.
/// The `:` separator can never appear in a component, so a hostile principal
/// cannot collide with another principal's `principal:endpoint` key.
pub fn safe_key_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_KEY_COMPONENT_LEN)
        .collect();
    if cleaned.is_empty() {
        "invalid".to_string()
    } else {
        cleaned
    }
}

/// Filename variant of [`safe_key_component`]: dots survive so extensions do.
pub fn safe_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .take(MAX_FILENAME_LEN)
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Removes `<...>` tag sequences. Text outside tags is preserved verbatim.
pub fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Normalizes a metadata value: tags stripped, control characters removed,
/// whitespace trimmed, length capped.
pub fn sanitize_metadata_value(raw: &str) -> String {
    strip_tags(raw)
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_METADATA_VALUE_LEN)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitizes a whole metadata map. Entries past `MAX_METADATA_ENTRIES` and
/// entries whose key or value sanitizes to empty are dropped.
pub fn sanitize_metadata(raw: &HashMap<String, String>) -> HashMap<String, String> {
    raw.iter()
        .filter_map(|(k, v)| {
            let key: String = k
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .take(MAX_METADATA_KEY_LEN)
                .collect();
            let value = sanitize_metadata_value(v);
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key, value))
            }
        })
        .take(MAX_METADATA_ENTRIES)
        .collect()
}

/// Validates an upload before it is stored: filename present, a supported
/// document extension, non-empty, and within the size cap.
pub fn validate_upload(filename: &str, size: usize) -> Result<(), AppError> {
    if filename.trim().is_empty() {
        return Err(AppError::Validation("A filename is required".to_string()));
    }
    if size == 0 {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "File exceeds the {} MB upload limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension {
        Some(ext) if ALLOWED_UPLOAD_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(AppError::Validation(format!(
            "Unsupported file type. Allowed: {}",
            ALLOWED_UPLOAD_EXTENSIONS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_key_component_passes_clean_input() {
        assert_eq!(safe_key_component("sess_12ab-34cd"), "sess_12ab-34cd");
    }

    #[test]
    fn test_safe_key_component_strips_separator() {
        // A principal containing ':' must not be able to forge another key.
        assert_eq!(safe_key_component("user:UPLOAD"), "userUPLOAD");
    }

    #[test]
    fn test_safe_key_component_strips_injection_chars() {
        assert_eq!(safe_key_component("a b<script>/../"), "abscript");
    }

    #[test]
    fn test_safe_key_component_empty_becomes_invalid() {
        assert_eq!(safe_key_component("!!!"), "invalid");
    }

    #[test]
    fn test_safe_key_component_caps_length() {
        let long = "x".repeat(200);
        assert_eq!(safe_key_component(&long).len(), MAX_KEY_COMPONENT_LEN);
    }

    #[test]
    fn test_safe_filename_keeps_extension() {
        assert_eq!(safe_filename("my resume (final).pdf"), "myresumefinal.pdf");
    }

    #[test]
    fn test_safe_filename_dots_only_becomes_unnamed() {
        assert_eq!(safe_filename("..."), "unnamed");
    }

    #[test]
    fn test_strip_tags_removes_markup() {
        assert_eq!(strip_tags("hi <b>there</b>!"), "hi there!");
    }

    #[test]
    fn test_strip_tags_drops_unclosed_tag() {
        assert_eq!(strip_tags("hello <script src="), "hello ");
    }

    #[test]
    fn test_sanitize_metadata_value_removes_control_chars() {
        assert_eq!(sanitize_metadata_value("a\u{0000}b\nc"), "abc");
    }

    #[test]
    fn test_sanitize_metadata_value_caps_length() {
        let long = "y".repeat(1000);
        assert_eq!(sanitize_metadata_value(&long).len(), MAX_METADATA_VALUE_LEN);
    }

    #[test]
    fn test_sanitize_metadata_drops_empty_entries() {
        let mut raw = HashMap::new();
        raw.insert("source".to_string(), "web".to_string());
        raw.insert("!!!".to_string(), "value".to_string());
        raw.insert("note".to_string(), "<script></script>".to_string());
        let clean = sanitize_metadata(&raw);
        assert_eq!(clean.len(), 1);
        assert_eq!(clean.get("source").map(String::as_str), Some("web"));
    }

    #[test]
    fn test_sanitize_metadata_caps_entry_count() {
        let raw: HashMap<String, String> = (0..40)
            .map(|i| (format!("key{i}"), "v".to_string()))
            .collect();
        assert_eq!(sanitize_metadata(&raw).len(), MAX_METADATA_ENTRIES);
    }

    #[test]
    fn test_validate_upload_accepts_pdf() {
        assert!(validate_upload("resume.pdf", 1024).is_ok());
    }

    #[test]
    fn test_validate_upload_rejects_unknown_extension() {
        assert!(validate_upload("resume.exe", 1024).is_err());
    }

    #[test]
    fn test_validate_upload_rejects_missing_extension() {
        assert!(validate_upload("resume", 1024).is_err());
    }

    #[test]
    fn test_validate_upload_rejects_empty_file() {
        assert!(validate_upload("resume.pdf", 0).is_err());
    }

    #[test]
    fn test_validate_upload_rejects_oversize() {
        assert!(validate_upload("resume.pdf", MAX_UPLOAD_BYTES + 1).is_err());
    }
}

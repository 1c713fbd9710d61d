//! Decoding of raw tool output into typed collections.
//!
//! The tool's output shape is not uniformly guaranteed across commands and
//! versions: the same command may print a JSON object, a JSON array, nothing
//! at all, or a plain-text sentinel phrase. Decoding therefore degrades to
//! "nothing" instead of propagating a failure.

use crate::invoker::Invocation;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Plain-text phrases the tool emits in lieu of JSON, matched
/// case-insensitively as prefixes of the trimmed output.
pub const EMPTY_SENTINELS: &[&str] = &["builder is not running", "no builder"];

/// Maximum number of bytes of offending output quoted in diagnostics.
const LOG_PREVIEW_LEN: usize = 160;

/// Decode a command result expected to hold a single entity.
///
/// Fallback order is fixed: failed invocation, sentinel/empty, single
/// object, array (first element), otherwise empty with a logged preview.
pub fn decode_entity<T: DeserializeOwned>(invocation: &Invocation) -> Option<T> {
    let mut list = decode_list(invocation);
    if list.is_empty() { None } else { Some(list.remove(0)) }
}

/// Decode a command result into a list of entities.
pub fn decode_list<T: DeserializeOwned>(invocation: &Invocation) -> Vec<T> {
    let Some(text) = usable_stdout(invocation) else {
        return Vec::new();
    };

    if is_empty_sentinel(text) {
        return Vec::new();
    }

    if let Ok(single) = serde_json::from_str::<T>(text) {
        return vec![single];
    }

    if let Ok(list) = serde_json::from_str::<Vec<T>>(text) {
        return list;
    }

    warn!(
        "Unrecognized tool output, treating as empty: {:?}",
        bounded_preview(text)
    );
    Vec::new()
}

/// Decode a command result holding a plain scalar (a domain name, a
/// property value). Quoted JSON strings are unwrapped.
pub fn decode_scalar(invocation: &Invocation) -> Option<String> {
    let text = usable_stdout(invocation)?;
    if is_empty_sentinel(text) {
        return None;
    }

    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let value = match serde_json::from_str::<String>(line) {
        Ok(unquoted) => unquoted,
        Err(_) => line.to_string(),
    };

    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trimmed stdout of a successful invocation, or `None` when the invocation
/// itself failed (in which case stdout is never inspected).
fn usable_stdout(invocation: &Invocation) -> Option<&str> {
    if invocation.failed {
        debug!("Invocation failed, decoding as empty: {}", invocation.diagnostic());
        return None;
    }
    Some(invocation.stdout.as_deref().unwrap_or("").trim())
}

/// Whether trimmed output means "nothing here": empty text, the JSON
/// literals `null` / `[]`, or a known sentinel phrase prefix.
pub fn is_empty_sentinel(trimmed: &str) -> bool {
    if trimmed.is_empty() || trimmed == "null" || trimmed == "[]" {
        return true;
    }

    let lowered = trimmed.to_ascii_lowercase();
    EMPTY_SENTINELS
        .iter()
        .any(|sentinel| lowered.starts_with(sentinel))
}

fn bounded_preview(text: &str) -> &str {
    if text.len() <= LOG_PREVIEW_LEN {
        return text;
    }
    let mut end = LOG_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(stdout: &str) -> Invocation {
        Invocation {
            exit_code: Some(0),
            stdout: Some(stdout.to_string()),
            stderr: Some(String::new()),
            failed: false,
        }
    }

    #[test]
    fn sentinels_decode_to_empty() {
        for text in ["", "  ", "null", "[]", "builder is not running", "No Builder found"] {
            let decoded: Vec<serde_json::Value> = decode_list(&ok(text));
            assert!(decoded.is_empty(), "expected empty for {text:?}");
        }
    }

    #[test]
    fn single_object_never_falls_through_to_empty() {
        let decoded: Option<serde_json::Value> = decode_entity(&ok(r#"{"id":"c1"}"#));
        assert_eq!(decoded.unwrap()["id"], "c1");
    }

    #[test]
    fn failed_invocation_short_circuits_before_stdout() {
        let invocation = Invocation {
            exit_code: Some(1),
            stdout: Some(r#"[{"id":"c1"}]"#.to_string()),
            stderr: Some("boom".to_string()),
            failed: true,
        };
        let decoded: Vec<serde_json::Value> = decode_list(&invocation);
        assert!(decoded.is_empty());
    }

    #[test]
    fn garbage_decodes_to_empty() {
        let decoded: Vec<serde_json::Value> = decode_list(&ok("Error: something strange"));
        assert!(decoded.is_empty());
    }

    #[test]
    fn scalar_unwraps_quoted_json() {
        assert_eq!(decode_scalar(&ok("\"test.local\"\n")), Some("test.local".to_string()));
        assert_eq!(decode_scalar(&ok("test.local")), Some("test.local".to_string()));
        assert_eq!(decode_scalar(&ok("null")), None);
        assert_eq!(decode_scalar(&ok("")), None);
    }

    #[test]
    fn preview_is_char_boundary_safe() {
        let text = "é".repeat(200);
        let preview = bounded_preview(&text);
        assert!(preview.len() <= LOG_PREVIEW_LEN);
        assert!(text.starts_with(preview));
    }
}

//! Response recovery — pulls the alternatives object out of raw model text.
//!
//! Model output is treated as untrusted input. The expected shape is
//! "valid JSON plus incidental wrapper text":
//!   1. unwrap ``` fences (markers removed, content kept in place)
//!   2. slice from the first `{` to the last `}`
//!   3. parse the slice
//!   4. require an `alternatives` array
//!   5. normalize the entries
//!
//! A slice that does not parse is reported, never repaired.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::normalize;
use super::provider::body_preview as preview;
use super::types::{Alternative, RewritePayload};

/// Result of recovering one raw response.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryOutcome {
    Success(Vec<Alternative>),
    /// No JSON object could be parsed. Carries the raw text unmodified.
    ParseFailure(String),
    /// Parsed, but `alternatives` is missing or not an array.
    SchemaFailure(Value),
    /// Valid shape, but every entry had empty text.
    EmptyResult,
}

impl RecoveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RecoveryOutcome::Success(_))
    }

    pub fn into_payload(self) -> RewritePayload {
        match self {
            RecoveryOutcome::Success(alternatives) => RewritePayload::Alternatives { alternatives },
            RecoveryOutcome::ParseFailure(raw) => RewritePayload::Degraded {
                error: "parse_failed",
                raw: Some(raw),
            },
            RecoveryOutcome::SchemaFailure(_) => RewritePayload::Degraded {
                error: "bad_schema",
                raw: None,
            },
            RecoveryOutcome::EmptyResult => RewritePayload::Degraded {
                error: "empty_alternatives",
                raw: None,
            },
        }
    }
}

/// A line holding only a fence marker, with optional language tag.
///
/// JSON strings cannot contain raw newlines, so a line-anchored marker
/// never sits inside an alternative's text.
fn fence_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_+.-]*[ \t]*\r?$").expect("valid fence regex")
    })
}

/// Remove the fence markers wrapping the response, keeping whatever they
/// wrapped. Backticks inside the content are left alone.
pub fn strip_code_fences(text: &str) -> String {
    let mut body = text.trim();

    // single-line wrapper: ```json{...}```
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start_matches(|c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '.' | '-')
        });
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }

    fence_line_re().replace_all(body, "").into_owned()
}

/// Greedy first-`{` .. last-`}` slice, inclusive.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Recover the alternatives from a raw generator response.
pub fn recover(raw: &str) -> RecoveryOutcome {
    let unfenced = strip_code_fences(raw);

    let Some(slice) = extract_json_object(&unfenced) else {
        log::warn!("[RECOVERY] No JSON object in response — raw: {}", preview(raw));
        return RecoveryOutcome::ParseFailure(raw.to_string());
    };

    let parsed: Value = match serde_json::from_str(slice) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("[RECOVERY] JSON parse failed: {} — raw: {}", e, preview(raw));
            return RecoveryOutcome::ParseFailure(raw.to_string());
        }
    };

    let Some(entries) = parsed.get("alternatives").and_then(Value::as_array) else {
        log::warn!("[RECOVERY] Parsed JSON has no alternatives array");
        return RecoveryOutcome::SchemaFailure(parsed);
    };

    let alternatives = normalize::normalize(entries);
    if alternatives.is_empty() {
        log::warn!(
            "[RECOVERY] All {} alternatives were empty",
            entries.len()
        );
        return RecoveryOutcome::EmptyResult;
    }

    log::info!(
        "[RECOVERY] Recovered {} of {} alternatives",
        alternatives.len(),
        entries.len()
    );
    RecoveryOutcome::Success(alternatives)
}

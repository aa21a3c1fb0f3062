//! Normalizer for parsed alternative entries.
//!
//! Every returned alternative has a non-empty label and non-empty text.
//! Missing labels become `Option N`, where N is the entry's 1-indexed
//! position in the model's array. Entries with blank text are dropped.
//! The alternative count is not enforced; an empty result is reported by
//! the caller (`RecoveryOutcome::EmptyResult`).

use serde_json::Value;

use super::types::Alternative;

pub fn normalize(entries: &[Value]) -> Vec<Alternative> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let text = entry.get("text").and_then(Value::as_str).unwrap_or_default();
            if text.trim().is_empty() {
                return None;
            }
            let label = match entry.get("label").and_then(Value::as_str) {
                Some(l) if !l.trim().is_empty() => l.to_string(),
                _ => placeholder_label(idx),
            };
            Some(Alternative {
                label,
                text: text.to_string(),
            })
        })
        .collect()
}

fn placeholder_label(idx: usize) -> String {
    format!("Option {}", idx + 1)
}

//! Prompt compiler — turns a validated edit request into the system
//! instructions and the user message sent to the generator.
//!
//! System instructions are always assembled in the same order:
//!   1. base rules (same for every action)
//!   2. voice profile (only when the profile has at least one field)
//!   3. action instruction
//!   4. response format (JSON shape + exact alternative count)
//!
//! The output is a pure function of the request: no timestamps, no
//! randomness, so identical requests compile to identical bytes.

use sha2::{Digest, Sha256};

use super::actions::ActionTemplate;
use super::types::{EditRequest, VoiceProfile};

const BASE_RULES: &str = r#"You are an editing assistant inside a note-taking app. The user selected a passage of their note and asked for a specific edit. You return alternative versions of the selected passage only.

<rules>
1. Rewrite ONLY the selected text. Never modify, repeat or continue text outside the selection.
2. Preserve the author's voice, terminology and language. If the selection is in French, answer in French.
3. Do NOT introduce facts, names, numbers or claims that are not already present in the note.
4. Keep roughly the same length as the selection unless the action explicitly asks to expand or condense.
5. Use the surrounding context only to understand the selection, never to copy from it.
</rules>"#;

/// Compiled prompt pair for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPrompt {
    pub system: String,
    pub user_message: String,
}

impl CompiledPrompt {
    /// SHA-256 of system + user text. Identical requests share a fingerprint,
    /// which makes repeated requests easy to spot in the logs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.system.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.user_message.as_bytes());
        format!("sha256:{:x}", hasher.finalize())
    }
}

/// Compile a validated request with its resolved template.
pub fn compile(request: &EditRequest, template: &ActionTemplate) -> CompiledPrompt {
    CompiledPrompt {
        system: build_system_instructions(template, request.voice_profile.as_ref()),
        user_message: build_user_message(request),
    }
}

pub fn build_system_instructions(
    template: &ActionTemplate,
    voice_profile: Option<&VoiceProfile>,
) -> String {
    let mut sections: Vec<String> = vec![BASE_RULES.to_string()];
    if let Some(block) = voice_profile.and_then(build_voice_profile_block) {
        sections.push(block);
    }
    sections.push(template.instruction.to_string());
    sections.push(build_response_format(template.expected_alternatives));
    sections.join("\n\n")
}

/// Voice-profile block, or `None` when no field is set.
pub fn build_voice_profile_block(profile: &VoiceProfile) -> Option<String> {
    let mut lines = Vec::new();
    let mut push = |label: &str, value: Option<&str>| {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            lines.push(format!("- {label}: {v}"));
        }
    };
    push("Preferred tone", profile.preferred_tone.as_deref());
    push("Audience", profile.audience.as_deref());
    push("Intent", profile.intent.as_deref());

    let languages: Vec<&str> = profile
        .languages
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if !languages.is_empty() {
        push("Languages", Some(&languages.join(", ")));
    }
    push("Style notes", profile.style_notes.as_deref());

    if lines.is_empty() {
        return None;
    }
    Some(format!(
        "<voice_profile>\nThe author described their writing voice. Follow it unless it conflicts with the rules above.\n{}\n</voice_profile>",
        lines.join("\n")
    ))
}

fn build_response_format(count: u8) -> String {
    format!(
        r#"<response_format>
Respond with ONLY this JSON object and exactly {count} entries in "alternatives". No prose before or after it. Do NOT wrap it in markdown or code fences.
{{
  "alternatives": [
    {{ "label": "<short description of this alternative, max 4 words>", "text": "<the rewritten selection>" }}
  ]
}}
</response_format>"#
    )
}

/// Labeled transcript of the note around the selection.
///
/// Context is expected to be truncated by the caller already.
pub fn build_user_message(request: &EditRequest) -> String {
    let title = or_placeholder(request.document_title.as_deref(), "(untitled)");
    let body = or_placeholder(request.document_body.as_deref(), "(empty)");
    let before = or_placeholder(request.context_before.as_deref(), "(start of note)");
    let after = or_placeholder(request.context_after.as_deref(), "(end of note)");
    let action = match request.tone_value.as_deref() {
        Some(tone) => format!("{} ({})", request.action, tone),
        None => request.action.to_string(),
    };

    format!(
        r#"<note_title>
{title}
</note_title>

<note>
{body}
</note>

<selection>
{selection}
</selection>

<context_before>
{before}
</context_before>

<context_after>
{after}
</context_after>

<requested_action>
{action}
</requested_action>"#,
        selection = request.selected_text,
    )
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => placeholder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::actions::{self, Action};

    fn request(action: Action) -> EditRequest {
        EditRequest {
            action,
            tone_value: (action == Action::Tone).then(|| "friendly".to_string()),
            document_title: Some("Trip notes".to_string()),
            document_body: Some("We leave Friday. The hotel is near the station.".to_string()),
            selected_text: "The hotel is near the station.".to_string(),
            context_before: Some("We leave Friday. ".to_string()),
            context_after: None,
            voice_profile: None,
        }
    }

    fn compiled(req: &EditRequest) -> CompiledPrompt {
        compile(req, &actions::resolve(req.action, req.tone_value.as_deref()))
    }

    #[test]
    fn compilation_is_deterministic() {
        for action in Action::ALL {
            let req = request(action);
            let a = compiled(&req);
            let b = compiled(&req);
            assert_eq!(a, b);
            assert_eq!(a.fingerprint(), b.fingerprint());
        }
    }

    #[test]
    fn system_mentions_expected_count() {
        for action in Action::ALL {
            let req = request(action);
            let template = actions::resolve(action, req.tone_value.as_deref());
            let prompt = compile(&req, &template);
            let needle = format!("exactly {} entries", template.expected_alternatives);
            assert!(prompt.system.contains(&needle), "{action}: {}", prompt.system);
        }
    }

    #[test]
    fn sections_are_in_fixed_order() {
        let mut req = request(Action::Shorter);
        req.voice_profile = Some(VoiceProfile {
            audience: Some("engineers".to_string()),
            ..Default::default()
        });
        let system = compiled(&req).system;
        let rules = system.find("<rules>").unwrap();
        let voice = system.find("<voice_profile>").unwrap();
        let action = system.find("<action>").unwrap();
        let format = system.find("<response_format>").unwrap();
        assert!(rules < voice && voice < action && action < format);
        assert!(system.contains("- Audience: engineers"));
        assert!(!system.contains("Preferred tone"));
    }

    #[test]
    fn no_voice_header_without_fields() {
        let mut req = request(Action::Rewrite);
        req.voice_profile = Some(VoiceProfile::default());
        assert!(!compiled(&req).system.contains("voice_profile"));
    }

    #[test]
    fn placeholders_fill_missing_fields() {
        let req = EditRequest {
            action: Action::Fix,
            tone_value: None,
            document_title: None,
            document_body: Some("  ".to_string()),
            selected_text: "teh cat".to_string(),
            context_before: None,
            context_after: None,
            voice_profile: None,
        };
        let msg = build_user_message(&req);
        assert!(msg.contains("(untitled)"));
        assert!(msg.contains("(empty)"));
        assert!(msg.contains("(start of note)"));
        assert!(msg.contains("(end of note)"));
        assert!(msg.contains("<selection>\nteh cat\n</selection>"));
    }

    #[test]
    fn tone_value_follows_action_name() {
        let msg = build_user_message(&request(Action::Tone));
        assert!(msg.contains("<requested_action>\ntone (friendly)\n</requested_action>"));

        let msg = build_user_message(&request(Action::Bullets));
        assert!(msg.contains("<requested_action>\nbullets\n</requested_action>"));
    }

    #[test]
    fn selection_is_verbatim() {
        let mut req = request(Action::Rewrite);
        req.selected_text = "  keep  my   spacing \n".to_string();
        assert!(build_user_message(&req).contains("  keep  my   spacing \n"));
    }
}

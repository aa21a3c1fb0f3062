//! Request and response types for the rewrite pipeline.
//!
//! `RewriteRequest` is the inbound JSON shape, exactly as a client sends it.
//! `validate()` turns it into an `EditRequest`, the only form the prompt
//! compiler accepts. Outbound payloads are `RewritePayload`.

use serde::{Deserialize, Deserializer, Serialize};

use super::actions::Action;
use crate::error::ValidationError;

/// Inbound request body. Every field is optional at this stage so that a
/// missing field becomes a typed validation error instead of a serde error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequest {
    pub action: Option<String>,
    pub tone_value: Option<String>,
    pub document_title: Option<String>,
    pub document_body: Option<String>,
    pub selected_text: Option<String>,
    pub context_before: Option<String>,
    pub context_after: Option<String>,
    pub voice_profile: Option<VoiceProfile>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub action: Action,
    /// Trimmed; only set for `tone`.
    pub tone_value: Option<String>,
    pub document_title: Option<String>,
    pub document_body: Option<String>,
    pub selected_text: String,
    pub context_before: Option<String>,
    pub context_after: Option<String>,
    pub voice_profile: Option<VoiceProfile>,
}

impl RewriteRequest {
    /// Reject anything the pipeline must not see. Runs before any generation call.
    pub fn validate(self) -> Result<EditRequest, ValidationError> {
        let action_raw = self
            .action
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or(ValidationError::MissingAction)?;
        // identifiers are exact: no trimming, no case folding
        let action: Action = action_raw
            .parse()
            .map_err(|_| ValidationError::UnknownAction(action_raw.to_string()))?;

        let selected_text = match self.selected_text {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Err(ValidationError::EmptySelection),
        };

        let tone_value = if action == Action::Tone {
            match self.tone_value.as_deref().map(str::trim) {
                Some(t) if !t.is_empty() => Some(t.to_string()),
                _ => return Err(ValidationError::MissingToneValue),
            }
        } else {
            None
        };

        Ok(EditRequest {
            action,
            tone_value,
            document_title: self.document_title,
            document_body: self.document_body,
            selected_text,
            context_before: self.context_before,
            context_after: self.context_after,
            voice_profile: self.voice_profile.filter(|p| !p.is_empty()),
        })
    }
}

/// Stylistic preferences folded into the system instruction.
///
/// Produced by an external collaborator (see `voice::VoiceProfileStore`).
/// Absent or blank fields are simply left out of the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProfile {
    #[serde(default, alias = "preferred_tone")]
    pub preferred_tone: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub languages: Vec<String>,
    #[serde(default, alias = "style_notes")]
    pub style_notes: Option<String>,
}

impl VoiceProfile {
    /// True when no field would produce a line in the prompt.
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.preferred_tone)
            && blank(&self.audience)
            && blank(&self.intent)
            && blank(&self.style_notes)
            && self.languages.iter().all(|l| l.trim().is_empty())
    }
}

/// `null` reads as an empty list, same as an absent field.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One candidate rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub label: String,
    pub text: String,
}

/// Body returned to the caller for every request that reached the generator.
///
/// `Alternatives` is the success shape. `Degraded` is still a 200: the
/// backend answered, but its output could not be used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RewritePayload {
    Alternatives {
        alternatives: Vec<Alternative>,
    },
    Degraded {
        error: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw: Option<String>,
    },
}

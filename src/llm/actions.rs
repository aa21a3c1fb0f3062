//! Action registry — one behavioral template per edit action.
//!
//! The table is static and never mutated. `tone` is the one action without a
//! row: its instruction depends on the requested tone, so it is built per
//! request by `build_tone_template`.
//!
//! Temperature policy: creative actions (rewrite, tone, example) sample
//! hotter than corrective ones (shorter, clearer, fix, expand, bullets).
//! Every creative temperature must stay above every corrective one.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;
pub const LONG_MAX_OUTPUT_TOKENS: u32 = 1400;

const TONE_ALTERNATIVES: u8 = 3;
const TONE_TEMPERATURE: f32 = 0.8;

/// A named text transformation the caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Rewrite,
    Shorter,
    Clearer,
    Fix,
    Tone,
    Expand,
    Bullets,
    Example,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::Rewrite,
        Action::Shorter,
        Action::Clearer,
        Action::Fix,
        Action::Tone,
        Action::Expand,
        Action::Bullets,
        Action::Example,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Rewrite => "rewrite",
            Action::Shorter => "shorter",
            Action::Clearer => "clearer",
            Action::Fix => "fix",
            Action::Tone => "tone",
            Action::Expand => "expand",
            Action::Bullets => "bullets",
            Action::Example => "example",
        }
    }

    /// Creative actions benefit from lexical variety; corrective ones must
    /// stay close to the source.
    pub fn is_creative(&self) -> bool {
        matches!(self, Action::Rewrite | Action::Tone | Action::Example)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an identifier is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Resolved behavior for one action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTemplate {
    pub instruction: Cow<'static, str>,
    /// Number of alternatives the model is asked for (2 or 3).
    pub expected_alternatives: u8,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

struct Row {
    action: Action,
    instruction: &'static str,
    expected_alternatives: u8,
    temperature: f32,
    max_output_tokens: u32,
}

static REGISTRY: [Row; 7] = [
    Row {
        action: Action::Rewrite,
        instruction: r#"<action>
Rewrite the selection so it reads better. Vary sentence structure and word choice between alternatives, but keep the meaning, the facts and roughly the same length.
</action>"#,
        expected_alternatives: 3,
        temperature: 0.8,
        max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
    },
    Row {
        action: Action::Shorter,
        instruction: r#"<action>
Make the selection shorter. Remove redundancy, filler words and repeated ideas. Each alternative should be noticeably more concise than the original while keeping every important point.
</action>"#,
        expected_alternatives: 3,
        temperature: 0.4,
        max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
    },
    Row {
        action: Action::Clearer,
        instruction: r#"<action>
Make the selection clearer. Remove ambiguity, untangle long sentences and make the logical flow explicit. Do not change what is being said.
</action>"#,
        expected_alternatives: 2,
        temperature: 0.4,
        max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
    },
    Row {
        action: Action::Fix,
        instruction: r#"<action>
Fix spelling, grammar and punctuation in the selection. Change nothing else: keep wording, style and formatting unless they are grammatically wrong. If the selection is already correct, return it unchanged as one of the alternatives.
</action>"#,
        expected_alternatives: 2,
        temperature: 0.2,
        max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
    },
    Row {
        action: Action::Expand,
        instruction: r#"<action>
Expand the selection with more detail and explanation. Develop only ideas that are already present in the note; do not add new claims, numbers or names.
</action>"#,
        expected_alternatives: 2,
        temperature: 0.5,
        max_output_tokens: LONG_MAX_OUTPUT_TOKENS,
    },
    Row {
        action: Action::Bullets,
        instruction: r#"<action>
Turn the selection into a bulleted list. One idea per bullet, "- " as the bullet marker, one bullet per line. Keep the original wording where possible.
</action>"#,
        expected_alternatives: 2,
        temperature: 0.3,
        max_output_tokens: LONG_MAX_OUTPUT_TOKENS,
    },
    Row {
        action: Action::Example,
        instruction: r#"<action>
Add a short, concrete example that illustrates the selection. Return the original selection followed by the example. The example must be consistent with the rest of the note and must not invent facts about real people or events.
</action>"#,
        expected_alternatives: 2,
        temperature: 0.9,
        max_output_tokens: LONG_MAX_OUTPUT_TOKENS,
    },
];

impl Row {
    fn template(&self) -> ActionTemplate {
        ActionTemplate {
            instruction: Cow::Borrowed(self.instruction),
            expected_alternatives: self.expected_alternatives,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// Look up the static template for an action.
///
/// Returns `None` for `tone`, which has no table row. Use
/// `build_tone_template` (or `resolve`) for it.
pub fn lookup(action: Action) -> Option<ActionTemplate> {
    REGISTRY
        .iter()
        .find(|row| row.action == action)
        .map(Row::template)
}

/// Build the `tone` template around the requested tone.
pub fn build_tone_template(tone_value: &str) -> ActionTemplate {
    let tone = tone_value.trim();
    ActionTemplate {
        instruction: Cow::Owned(format!(
            "<action>\nRewrite the selection in a {tone} tone. Adjust word choice, rhythm and formality to sound {tone}, but keep the meaning, the facts and roughly the same length.\n</action>"
        )),
        expected_alternatives: TONE_ALTERNATIVES,
        temperature: TONE_TEMPERATURE,
        max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
    }
}

/// Static template, or the `rewrite` template when the action has no row.
pub fn template_for(action: Action) -> ActionTemplate {
    lookup(action).unwrap_or_else(|| REGISTRY[0].template())
}

/// Resolve the template for a validated request.
///
/// `tone` with a missing tone value never gets here in the pipeline;
/// validation rejects it first.
pub fn resolve(action: Action, tone_value: Option<&str>) -> ActionTemplate {
    match (action, tone_value) {
        (Action::Tone, Some(tone)) if !tone.trim().is_empty() => build_tone_template(tone),
        _ => template_for(action),
    }
}

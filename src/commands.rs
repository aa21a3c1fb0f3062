//! Request handlers — the one entry point every transport wraps.
//!
//! A transport (HTTP route, CLI, message queue) hands over the raw JSON
//! body and gets back a status code plus a JSON payload. All parsing,
//! context bounding, validation and response shaping happens here, so
//! transports stay thin.
//!
//! Status policy:
//!   200  alternatives, or a degraded payload (parse_failed / bad_schema /
//!        empty_alternatives): the generator answered but its output was unusable
//!   4xx  request rejected before generation
//!   5xx  credential, transport or upstream failure

use serde::Serialize;
use serde_json::Value;

use crate::config::Settings;
use crate::error::{RewriteError, ValidationError};
use crate::llm::provider::Generator;
use crate::llm::rewrite;
use crate::llm::types::RewriteRequest;
use crate::llm::voice::VoiceProfileStore;

/// What a transport sends back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    pub status: u16,
    pub body: Value,
}

impl CommandResponse {
    fn from_error(err: &RewriteError) -> Self {
        Self {
            status: err.status_code(),
            body: serde_json::json!({
                "error": err.code(),
                "message": err.to_string(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Long-lived handler state: the generator, settings and an optional
/// voice-profile source. Holds no per-request state.
pub struct RewriteService {
    generator: Option<Box<dyn Generator>>,
    settings: Settings,
    voice_profiles: Option<Box<dyn VoiceProfileStore>>,
}

impl RewriteService {
    pub fn new(generator: Box<dyn Generator>, settings: Settings) -> Self {
        Self {
            generator: Some(generator),
            settings,
            voice_profiles: None,
        }
    }

    /// Build the configured provider. A missing credential does not fail
    /// startup; each request that reaches generation reports it instead.
    pub fn from_settings(settings: Settings) -> Result<Self, RewriteError> {
        let generator = match settings.build_generator() {
            Ok(g) => Some(g),
            Err(RewriteError::MissingCredential(provider)) => {
                log::warn!("[REWRITE] No API key for {} — requests will fail", provider);
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            generator,
            settings,
            voice_profiles: None,
        })
    }

    pub fn with_voice_profiles(mut self, store: Box<dyn VoiceProfileStore>) -> Self {
        self.voice_profiles = Some(store);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle a raw JSON body.
    pub async fn handle(&self, body: &str, user_id: Option<&str>) -> CommandResponse {
        let request: RewriteRequest = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) => {
                let err = RewriteError::from(ValidationError::Malformed(e.to_string()));
                log::warn!("[REWRITE] {}", err);
                return CommandResponse::from_error(&err);
            }
        };
        self.handle_request(request, user_id).await
    }

    /// Handle an already-deserialized request.
    pub async fn handle_request(
        &self,
        mut request: RewriteRequest,
        user_id: Option<&str>,
    ) -> CommandResponse {
        let window = self.settings.context_chars;
        request.context_before = request
            .context_before
            .map(|c| truncate_context_before(&c, window).to_string());
        request.context_after = request
            .context_after
            .map(|c| truncate_context_after(&c, window).to_string());

        if request.voice_profile.is_none() {
            if let (Some(store), Some(user)) = (&self.voice_profiles, user_id) {
                request.voice_profile = store.fetch(user);
            }
        }

        let edit = match request.validate() {
            Ok(edit) => edit,
            Err(e) => {
                log::warn!("[REWRITE] Rejected request: {}", e);
                return CommandResponse::from_error(&RewriteError::from(e));
            }
        };

        let Some(generator) = self.generator.as_deref() else {
            let err = RewriteError::MissingCredential(self.settings.provider.to_string());
            log::error!("[REWRITE] {}", err);
            return CommandResponse::from_error(&err);
        };

        match rewrite::run(&edit, generator, self.settings.timeout).await {
            Ok(outcome) => {
                let payload = outcome.into_payload();
                CommandResponse {
                    status: 200,
                    body: serde_json::to_value(&payload).unwrap_or(Value::Null),
                }
            }
            Err(err) => {
                log::error!("[REWRITE] {}", err);
                CommandResponse::from_error(&err)
            }
        }
    }
}

/// Keep the last `max_chars` characters (the text nearest the selection).
pub fn truncate_context_before(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    match text.char_indices().nth(count - max_chars) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

/// Keep the first `max_chars` characters (the text nearest the selection).
pub fn truncate_context_after(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

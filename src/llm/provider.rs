//! Generator trait and provider metadata.
//!
//! The backend is an opaque capability: system instructions + user message
//! + sampling settings in, raw text out. Each HTTP provider implements
//! `Generator`; the pipeline only ever sees the trait.
//!
//! Contract for implementations: one attempt per call (no internal retry),
//! `RewriteError::Timeout`/`Transport` when the backend cannot be reached,
//! `RewriteError::Backend` with the status code on a non-success answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;

/// Everything a backend needs for one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationRequest<'a> {
    pub system: &'a str,
    pub user_message: &'a str,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider id, for logs.
    fn id(&self) -> &str;

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Anthropic,
    Gemini,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Anthropic, ProviderId::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "anthropic",
            ProviderId::Gemini => "gemini",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn env_key(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "ANTHROPIC_API_KEY",
            ProviderId::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => super::anthropic::DEFAULT_MODEL,
            ProviderId::Gemini => super::gemini::DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(ProviderId::Anthropic),
            "gemini" => Ok(ProviderId::Gemini),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

/// Bounded, char-safe preview of an error body for logs and diagnostics.
pub(crate) fn body_preview(body: &str) -> String {
    match body.char_indices().nth(200) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

/// Provider metadata, printed by `note-rewrite --list-providers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub env_key: String,
    pub default_model: String,
}

/// All known providers and their display info.
pub fn all_providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo {
            id: ProviderId::Anthropic.to_string(),
            name: "Claude Haiku — fast, cheap, good at following JSON formats".to_string(),
            env_key: ProviderId::Anthropic.env_key().to_string(),
            default_model: ProviderId::Anthropic.default_model().to_string(),
        },
        ProviderInfo {
            id: ProviderId::Gemini.to_string(),
            name: "Gemini Flash — free tier available".to_string(),
            env_key: ProviderId::Gemini.env_key().to_string(),
            default_model: ProviderId::Gemini.default_model().to_string(),
        },
    ]
}

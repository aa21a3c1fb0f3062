//! Runtime configuration and provider resolution.
//!
//! Handles:
//! - `.env.local` / `.env` loading (dotenvy)
//! - provider choice (explicit override, else first provider with a key)
//! - API key lookup (env var, then OS keychain via keyring), resolved once
//!   from the same sources as the rest of the settings
//! - timeout and context-window settings
//!
//! Variables:
//!   LLM_PROVIDER           anthropic | gemini
//!   LLM_MODEL              model override for the chosen provider
//!   LLM_BASE_URL           endpoint override (proxies, tests)
//!   REWRITE_TIMEOUT_SECS   generator timeout, clamped to 10..=60 (default 30)
//!   REWRITE_CONTEXT_CHARS  context window per side (default 600)

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, RewriteError};
use crate::llm::anthropic::AnthropicGenerator;
use crate::llm::gemini::GeminiGenerator;
use crate::llm::provider::{Generator, ProviderId};

pub const KEYRING_SERVICE: &str = "note-rewrite";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MIN_TIMEOUT_SECS: u64 = 10;
pub const MAX_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONTEXT_CHARS: usize = 600;

#[derive(Clone, PartialEq)]
pub struct Settings {
    pub provider: ProviderId,
    /// Credential for `provider`, if one was found.
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Duration,
    /// Max chars of context kept on each side of the selection.
    pub context_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderId::Anthropic,
            api_key: None,
            model: None,
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            context_chars: DEFAULT_CONTEXT_CHARS,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("context_chars", &self.context_chars)
            .finish()
    }
}

impl Settings {
    /// Settings from the process environment, with the OS keychain as the
    /// credential fallback.
    pub fn from_env() -> Self {
        Self::from_sources(|key| std::env::var(key).ok(), keychain_api_key)
    }

    /// Settings from an arbitrary variable lookup. Credentials come from
    /// the lookup only; the keychain is not consulted.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_sources(lookup, |_| None)
    }

    /// Settings from a variable lookup plus a credential fallback queried
    /// per provider when its env var is unset.
    pub fn from_sources<F, K>(lookup: F, keychain: K) -> Self
    where
        F: Fn(&str) -> Option<String>,
        K: Fn(ProviderId) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let key_for = |id: ProviderId| lookup_api_key(id, &lookup, &keychain);

        let provider = resolve_provider(&lookup, &key_for);
        let api_key = key_for(provider);

        let timeout_secs = match non_empty("REWRITE_TIMEOUT_SECS").map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) => secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
            Some(Err(e)) => {
                log::warn!("[CONFIG] Ignoring invalid REWRITE_TIMEOUT_SECS: {}", e);
                DEFAULT_TIMEOUT_SECS
            }
            None => DEFAULT_TIMEOUT_SECS,
        };

        let context_chars = match non_empty("REWRITE_CONTEXT_CHARS").map(|v| v.parse::<usize>()) {
            Some(Ok(chars)) => chars,
            Some(Err(e)) => {
                log::warn!("[CONFIG] Ignoring invalid REWRITE_CONTEXT_CHARS: {}", e);
                DEFAULT_CONTEXT_CHARS
            }
            None => DEFAULT_CONTEXT_CHARS,
        };

        Self {
            provider,
            api_key,
            model: non_empty("LLM_MODEL"),
            base_url: non_empty("LLM_BASE_URL"),
            timeout: Duration::from_secs(timeout_secs),
            context_chars,
        }
    }

    /// API key for the configured provider.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| RewriteError::MissingCredential(self.provider.to_string()))
    }

    /// Build the HTTP generator for the configured provider.
    pub fn build_generator(&self) -> Result<Box<dyn Generator>> {
        let api_key = self.require_api_key()?.to_string();
        log::info!(
            "[CONFIG] Provider: {}, API key present ({} chars), timeout {}s",
            self.provider,
            api_key.len(),
            self.timeout.as_secs()
        );
        let generator: Box<dyn Generator> = match self.provider {
            ProviderId::Anthropic => {
                let mut g = AnthropicGenerator::new(api_key, self.timeout)?;
                if let Some(model) = &self.model {
                    g = g.with_model(model);
                }
                if let Some(url) = &self.base_url {
                    g = g.with_base_url(url);
                }
                Box::new(g)
            }
            ProviderId::Gemini => {
                let mut g = GeminiGenerator::new(api_key, self.timeout)?;
                if let Some(model) = &self.model {
                    g = g.with_model(model);
                }
                if let Some(url) = &self.base_url {
                    g = g.with_base_url(url);
                }
                Box::new(g)
            }
        };
        Ok(generator)
    }
}

/// Determine which LLM provider to use.
///
/// Priority:
/// 1. LLM_PROVIDER (explicit override)
/// 2. First provider with an API key (`key_for`)
/// 3. anthropic (requests will then fail with a missing credential)
pub fn resolve_provider<F, K>(lookup: &F, key_for: &K) -> ProviderId
where
    F: Fn(&str) -> Option<String>,
    K: Fn(ProviderId) -> Option<String>,
{
    if let Some(p) = lookup("LLM_PROVIDER").filter(|p| !p.trim().is_empty()) {
        match p.parse::<ProviderId>() {
            Ok(id) => {
                log::info!("[CONFIG] Provider override: {}", id);
                return id;
            }
            Err(e) => log::warn!("[CONFIG] Ignoring LLM_PROVIDER: {}", e),
        }
    }

    ProviderId::ALL
        .into_iter()
        .find(|id| key_for(*id).is_some())
        .unwrap_or(ProviderId::Anthropic)
}

/// API key from the env var, falling back to `keychain`.
fn lookup_api_key<F, K>(provider: ProviderId, lookup: &F, keychain: &K) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
    K: Fn(ProviderId) -> Option<String>,
{
    lookup(provider.env_key())
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| keychain(provider))
}

/// API key stored in the OS keychain for `provider`.
pub fn keychain_api_key(provider: ProviderId) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, provider.as_str()).ok()?;
    match entry.get_password() {
        Ok(key) if !key.is_empty() => {
            log::info!("[CONFIG] Loaded {} key from OS keychain", provider);
            Some(key)
        }
        _ => None,
    }
}

/// Save an API key to the OS keychain.
pub fn save_api_key(provider: ProviderId, api_key: &str) -> std::result::Result<(), String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, provider.as_str())
        .map_err(|e| format!("Keyring error: {}", e))?;
    entry
        .set_password(api_key)
        .map_err(|e| format!("Failed to save key: {}", e))?;
    log::info!("[CONFIG] API key saved for provider: {}", provider);
    Ok(())
}

/// Load `.env.local`, else `.env`, from `dir`. Returns the file that was loaded.
pub fn load_env_files(dir: &Path) -> Option<std::path::PathBuf> {
    for env_file in [".env.local", ".env"] {
        let path = dir.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => return Some(path),
                Err(e) => {
                    log::warn!("[STARTUP] Failed to load {}: {}", path.display(), e);
                    return None;
                }
            }
        }
    }
    None
}

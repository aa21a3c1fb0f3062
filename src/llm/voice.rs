//! Voice profile lookup.
//!
//! Profiles are owned by an external collaborator; this module only reads
//! them. The file-backed store keeps one JSON document per user in
//! `~/.config/note-rewrite/voice-profiles/{user_id}.json`.
//!
//! A missing, unreadable or empty profile means "no profile". It is never
//! an error: the prompt simply omits the voice block.

use std::path::PathBuf;

use super::types::VoiceProfile;

pub trait VoiceProfileStore: Send + Sync {
    fn fetch(&self, user_id: &str) -> Option<VoiceProfile>;
}

pub struct FileVoiceProfileStore {
    dir: PathBuf,
}

impl FileVoiceProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform config dir.
    pub fn default_location() -> Self {
        Self::new(
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("note-rewrite")
                .join("voice-profiles"),
        )
    }

    fn profile_path(&self, user_id: &str) -> Option<PathBuf> {
        let safe = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !user_id.starts_with('.');
        if !safe {
            log::warn!("[VOICE] Refusing unsafe user id: {:?}", user_id);
            return None;
        }
        Some(self.dir.join(format!("{}.json", user_id)))
    }

    /// Persist a profile. Creates the directory if needed.
    pub fn save(&self, user_id: &str, profile: &VoiceProfile) -> Result<(), String> {
        let path = self
            .profile_path(user_id)
            .ok_or_else(|| format!("Invalid user id: {}", user_id))?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("Failed to create profile dir: {}", e))?;
        let json = serde_json::to_string_pretty(profile)
            .map_err(|e| format!("Failed to serialize profile: {}", e))?;
        std::fs::write(&path, json).map_err(|e| format!("Failed to write profile: {}", e))?;
        log::info!("[VOICE] Saved profile for '{}'", user_id);
        Ok(())
    }
}

impl VoiceProfileStore for FileVoiceProfileStore {
    fn fetch(&self, user_id: &str) -> Option<VoiceProfile> {
        let path = self.profile_path(user_id)?;
        let raw = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<VoiceProfile>(&raw) {
            Ok(profile) if !profile.is_empty() => Some(profile),
            Ok(_) => None,
            Err(e) => {
                log::warn!("[VOICE] Ignoring unreadable profile {}: {}", path.display(), e);
                None
            }
        }
    }
}

//! Hard errors for the rewrite pipeline.
//!
//! Only conditions that stop the pipeline live here: a request that failed
//! validation, a missing credential, or a generator that could not be
//! reached / answered with a failure status. Unusable model *content* is not
//! an error — see `llm::recovery::RecoveryOutcome`.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RewriteError>;

/// Request rejected at the acceptance boundary, before any generation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing action")]
    MissingAction,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Selected text is empty")]
    EmptySelection,

    #[error("Action 'tone' requires a non-empty toneValue")]
    MissingToneValue,

    #[error("Invalid request body: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingAction => "missing_action",
            ValidationError::UnknownAction(_) => "unknown_action",
            ValidationError::EmptySelection => "empty_selection",
            ValidationError::MissingToneValue => "missing_tone",
            ValidationError::Malformed(_) => "invalid_request",
        }
    }
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No API key configured for provider '{0}'")]
    MissingCredential(String),

    #[error("Generator timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Generator unreachable: {0}")]
    Transport(String),

    /// Generator answered with a non-success status. `body` is a bounded
    /// preview kept for diagnostics.
    #[error("Generator returned status {status}")]
    Backend { status: u16, body: String },
}

impl RewriteError {
    /// HTTP status a transport adapter should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            RewriteError::Validation(_) => 400,
            RewriteError::MissingCredential(_) => 500,
            RewriteError::Timeout(_) => 504,
            RewriteError::Transport(_) | RewriteError::Backend { .. } => 502,
        }
    }

    /// Stable machine-readable code for the error payload.
    pub fn code(&self) -> &'static str {
        match self {
            RewriteError::Validation(v) => v.code(),
            RewriteError::MissingCredential(_) => "missing_credential",
            RewriteError::Timeout(_) => "upstream_timeout",
            RewriteError::Transport(_) => "upstream_unreachable",
            RewriteError::Backend { .. } => "upstream_error",
        }
    }

    /// Map a reqwest failure, keeping timeouts distinct from other transport errors.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            RewriteError::Timeout(timeout)
        } else {
            RewriteError::Transport(err.to_string())
        }
    }
}

//! LLM domain — selection rewriting pipeline.
//!
//! Public API for the rewrite core. External code should go through
//! `rewrite::rewrite` / `rewrite::run`, or through `commands::RewriteService`
//! when it needs transport-shaped responses.
//!
//! Pipeline, leaf-first:
//!   - actions.rs   — action registry (templates, cardinality, temperature)
//!   - prompts.rs   — system instructions + user message compiler
//!   - provider.rs  — `Generator` trait + provider metadata
//!   - anthropic.rs / gemini.rs — HTTP generators
//!   - recovery.rs  — fence stripping + JSON object extraction
//!   - normalize.rs — label/text coercion and empty filtering
//!   - voice.rs     — per-user voice profile storage
//!   - rewrite.rs   — orchestration

pub mod actions;
pub mod anthropic;
pub mod gemini;
pub mod normalize;
pub mod prompts;
pub mod provider;
pub mod recovery;
pub mod rewrite;
pub mod types;
pub mod voice;

pub use actions::{Action, ActionTemplate};
pub use provider::{GenerationRequest, Generator, ProviderId};
pub use recovery::RecoveryOutcome;
pub use rewrite::rewrite;
pub use types::{Alternative, EditRequest, RewritePayload, RewriteRequest, VoiceProfile};

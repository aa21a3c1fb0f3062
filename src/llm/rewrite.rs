//! REWRITE pipeline — validated edit request → alternatives.
//!
//! Steps:
//! 1. Resolve the action template (registry, or tone constructor)
//! 2. Compile system instructions + user message
//! 3. Invoke the generator once, bounded by a timeout
//! 4. Recover and normalize the alternatives from the raw text
//!
//! Steps 1–3 fail hard (`RewriteError`). Step 4 never fails: unusable
//! content comes back as a non-success `RecoveryOutcome`.

use std::time::{Duration, Instant};

use super::actions::{self, ActionTemplate};
use super::prompts::{self, CompiledPrompt};
use super::provider::{GenerationRequest, Generator};
use super::recovery::{self, RecoveryOutcome};
use super::types::{EditRequest, RewriteRequest};
use crate::error::{Result, RewriteError};

/// Submit one compiled prompt to the generator. Single attempt, no retry.
///
/// The timeout wraps the whole call, including the body read, on top of
/// whatever timeout the provider's HTTP client enforces.
pub async fn invoke(
    generator: &dyn Generator,
    prompt: &CompiledPrompt,
    template: &ActionTemplate,
    timeout: Duration,
) -> Result<String> {
    let request = GenerationRequest {
        system: &prompt.system,
        user_message: &prompt.user_message,
        temperature: template.temperature,
        max_output_tokens: template.max_output_tokens,
    };
    match tokio::time::timeout(timeout, generator.generate(request)).await {
        Ok(result) => result,
        Err(_) => {
            log::error!(
                "[REWRITE] {} did not answer within {}s",
                generator.id(),
                timeout.as_secs()
            );
            Err(RewriteError::Timeout(timeout))
        }
    }
}

/// Run a validated request through compile → invoke → recover.
pub async fn run(
    request: &EditRequest,
    generator: &dyn Generator,
    timeout: Duration,
) -> Result<RecoveryOutcome> {
    let start = Instant::now();
    let template = actions::resolve(request.action, request.tone_value.as_deref());
    let prompt = prompts::compile(request, &template);

    log::info!(
        "[REWRITE] Action: {}, selection: {} chars, expecting {} alternatives",
        request.action,
        request.selected_text.chars().count(),
        template.expected_alternatives
    );
    log::debug!("[PROMPT] Fingerprint: {}", prompt.fingerprint());

    let raw = invoke(generator, &prompt, &template, timeout).await?;
    log::info!(
        "[REWRITE] Generator returned {} chars in {}ms",
        raw.len(),
        start.elapsed().as_millis()
    );

    let outcome = recovery::recover(&raw);
    if let RecoveryOutcome::Success(alternatives) = &outcome {
        if alternatives.len() < template.expected_alternatives as usize {
            log::info!(
                "[REWRITE] Got {} of {} requested alternatives",
                alternatives.len(),
                template.expected_alternatives
            );
        }
    }
    Ok(outcome)
}

/// Validate an inbound request, then run it.
///
/// Validation errors return before the generator is touched.
pub async fn rewrite(
    request: RewriteRequest,
    generator: &dyn Generator,
    timeout: Duration,
) -> Result<RecoveryOutcome> {
    let request = request.validate().map_err(|e| {
        log::warn!("[REWRITE] Rejected request: {}", e);
        RewriteError::from(e)
    })?;
    run(&request, generator, timeout).await
}

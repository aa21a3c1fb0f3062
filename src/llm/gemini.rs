//! Gemini Flash generator via the Google AI `generateContent` API.
//!
//! Differences from the Anthropic provider:
//! - API key in URL query param, not header
//! - system prompt goes in `systemInstruction`, sampling in `generationConfig`
//! - text lives in `candidates[0].content.parts[*].text` (concatenated)
//! - token usage in `usageMetadata`
//!
//! `responseMimeType: "application/json"` is requested, but the reply still
//! goes through full recovery: the mime hint is advisory.

use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::provider::{body_preview, GenerationRequest, Generator};
use crate::error::{Result, RewriteError};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini Flash pricing (under 128k context).
const INPUT_COST_PER_MILLION: f64 = 0.10;
const OUTPUT_COST_PER_MILLION: f64 = 0.40;

pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RewriteError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        log::info!("[LLM] Provider: gemini, model: {}", self.model);
        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "contents": [
                    {
                        "role": "user",
                        "parts": [{"text": request.user_message}]
                    }
                ],
                "systemInstruction": {
                    "parts": [{"text": request.system}]
                },
                "generationConfig": {
                    "maxOutputTokens": request.max_output_tokens,
                    "temperature": request.temperature,
                    "responseMimeType": "application/json"
                }
            }))
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the URL, which carries the key
                let e = e.without_url();
                log::error!("[LLM] HTTP request failed: {}", e);
                RewriteError::from_reqwest(e, self.timeout)
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RewriteError::from_reqwest(e.without_url(), self.timeout))?;

        if !status.is_success() {
            log::error!("[LLM] Gemini API returned {}: {}", status, body_preview(&body));
            return Err(RewriteError::Backend {
                status: status.as_u16(),
                body: body_preview(&body),
            });
        }

        log::info!("[LLM] API latency: {}ms", start.elapsed().as_millis());

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            log::error!("[LLM] Response envelope is not JSON: {}", e);
            RewriteError::Backend {
                status: status.as_u16(),
                body: body_preview(&body),
            }
        })?;

        log_usage(&parsed);

        match extract_gemini_text(&parsed) {
            Some(text) => Ok(text),
            None => {
                log::warn!("[LLM] No candidate text in Gemini response");
                Ok(String::new())
            }
        }
    }
}

/// Concatenated text parts of the first candidate.
fn extract_gemini_text(parsed: &Value) -> Option<String> {
    let parts = parsed
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn log_usage(parsed: &Value) {
    let Some(usage) = parsed.get("usageMetadata") else {
        return;
    };
    let input_tokens = usage["promptTokenCount"].as_u64().unwrap_or(0);
    let output_tokens = usage["candidatesTokenCount"].as_u64().unwrap_or(0);
    let cost = (input_tokens as f64 * INPUT_COST_PER_MILLION
        + output_tokens as f64 * OUTPUT_COST_PER_MILLION)
        / 1_000_000.0;
    log::info!(
        "[LLM] Tokens: {} in / {} out, estimated cost: ${:.6}",
        input_tokens,
        output_tokens,
        cost
    );
}

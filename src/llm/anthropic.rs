//! Anthropic Messages API generator (non-streaming).
//!
//! One POST to `/v1/messages` per call. The raw text is the first `text`
//! content block of the reply; a 2xx reply without one yields an empty
//! string, which recovery then reports as `parse_failed`.

use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::provider::{body_preview, GenerationRequest, Generator};
use crate::error::{Result, RewriteError};

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Haiku pricing: $0.80/M input, $4/M output.
const INPUT_COST_PER_MILLION: f64 = 0.80;
const OUTPUT_COST_PER_MILLION: f64 = 4.0;

pub struct AnthropicGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl AnthropicGenerator {
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
impl Generator for AnthropicGenerator {
    fn id(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        log::info!("[LLM] Provider: anthropic, model: {}", self.model);
        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": request.max_output_tokens,
                "temperature": request.temperature,
                "system": request.system,
                "messages": [{"role": "user", "content": request.user_message}]
            }))
            .send()
            .await
            .map_err(|e| {
                log::error!("[LLM] HTTP request failed: {}", e);
                RewriteError::from_reqwest(e, self.timeout)
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RewriteError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            log::error!("[LLM] API returned {}: {}", status, body_preview(&body));
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

        match extract_anthropic_text(&parsed) {
            Some(text) => Ok(text),
            None => {
                log::warn!("[LLM] No text block in response");
                Ok(String::new())
            }
        }
    }
}

/// Text of the first `text` content block.
fn extract_anthropic_text(parsed: &Value) -> Option<String> {
    parsed
        .get("content")?
        .as_array()?
        .iter()
        .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

fn log_usage(parsed: &Value) {
    let Some(usage) = parsed.get("usage") else {
        return;
    };
    let input_tokens = usage["input_tokens"].as_u64().unwrap_or(0);
    let output_tokens = usage["output_tokens"].as_u64().unwrap_or(0);
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

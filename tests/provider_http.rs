//! HTTP generators against a local one-shot stub server.
//!
//! Checks the wire shape each provider sends and how it maps replies
//! (success, upstream errors, unreachable host) onto `RewriteError`.

mod support;

use note_rewrite_lib::llm::anthropic::AnthropicGenerator;
use note_rewrite_lib::llm::gemini::GeminiGenerator;
use note_rewrite_lib::llm::{GenerationRequest, Generator};
use note_rewrite_lib::{RewriteError, RewriteService, Settings};
use serde_json::json;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

fn request() -> GenerationRequest<'static> {
    GenerationRequest {
        system: "SYSTEM RULES",
        user_message: "<selection>\nhello\n</selection>",
        temperature: 0.4,
        max_output_tokens: 800,
    }
}

fn anthropic_reply(text: &str) -> String {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 120, "output_tokens": 40}
    })
    .to_string()
}

fn gemini_reply(parts: &[&str]) -> String {
    let parts: Vec<_> = parts.iter().map(|p| json!({"text": p})).collect();
    json!({
        "candidates": [{"content": {"role": "model", "parts": parts}}],
        "usageMetadata": {"promptTokenCount": 90, "candidatesTokenCount": 30}
    })
    .to_string()
}

// ── Anthropic ────────────────────────────────────────────────────────

#[tokio::test]
async fn anthropic_sends_messages_request() {
    let (base, server) = support::serve_once(200, &anthropic_reply("raw model text")).await;
    let generator = AnthropicGenerator::new("sk-test", TIMEOUT)
        .unwrap()
        .with_model("claude-test")
        .with_base_url(&base);

    let text = generator.generate(request()).await.unwrap();
    assert_eq!(text, "raw model text");

    let raw = server.await.unwrap();
    let lower = raw.to_lowercase();
    assert!(raw.starts_with("POST /v1/messages "));
    assert!(lower.contains("x-api-key: sk-test"));
    assert!(lower.contains("anthropic-version: 2023-06-01"));

    let body_start = raw.find("\r\n\r\n").unwrap() + 4;
    let body: serde_json::Value = serde_json::from_str(&raw[body_start..]).unwrap();
    assert_eq!(body["model"], "claude-test");
    assert_eq!(body["system"], "SYSTEM RULES");
    assert_eq!(body["max_tokens"], 800);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "<selection>\nhello\n</selection>");
    assert!((body["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
}

#[tokio::test]
async fn anthropic_overload_is_backend_error() {
    let (base, _server) =
        support::serve_once(529, r#"{"type":"error","error":{"type":"overloaded_error"}}"#).await;
    let generator = AnthropicGenerator::new("sk-test", TIMEOUT)
        .unwrap()
        .with_base_url(&base);

    match generator.generate(request()).await {
        Err(RewriteError::Backend { status, body }) => {
            assert_eq!(status, 529);
            assert!(body.contains("overloaded_error"));
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn anthropic_without_text_block_yields_empty_text() {
    let reply = json!({"content": [{"type": "tool_use", "id": "x"}]}).to_string();
    let (base, _server) = support::serve_once(200, &reply).await;
    let generator = AnthropicGenerator::new("sk-test", TIMEOUT)
        .unwrap()
        .with_base_url(&base);

    assert_eq!(generator.generate(request()).await.unwrap(), "");
}

#[tokio::test]
async fn non_json_envelope_is_backend_error() {
    let (base, _server) = support::serve_once(200, "<html>gateway</html>").await;
    let generator = AnthropicGenerator::new("sk-test", TIMEOUT)
        .unwrap()
        .with_base_url(&base);

    let err = generator.generate(request()).await.unwrap_err();
    assert!(matches!(err, RewriteError::Backend { status: 200, .. }));
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let base = support::dead_address().await;
    let generator = AnthropicGenerator::new("sk-test", TIMEOUT)
        .unwrap()
        .with_base_url(&base);

    let err = generator.generate(request()).await.unwrap_err();
    assert!(matches!(err, RewriteError::Transport(_)), "{:?}", err);
    assert_eq!(err.code(), "upstream_unreachable");
}

// ── Gemini ───────────────────────────────────────────────────────────

#[tokio::test]
async fn gemini_sends_generate_content_request() {
    let (base, server) = support::serve_once(200, &gemini_reply(&["{\"alter", "natives\":[]}"])).await;
    let generator = GeminiGenerator::new("g-key", TIMEOUT)
        .unwrap()
        .with_model("gemini-test")
        .with_base_url(&base);

    let text = generator.generate(request()).await.unwrap();
    assert_eq!(text, "{\"alternatives\":[]}");

    let raw = server.await.unwrap();
    let request_line = raw.lines().next().unwrap();
    assert!(request_line.starts_with("POST /v1beta/models/gemini-test:generateContent?key=g-key "));

    let body_start = raw.find("\r\n\r\n").unwrap() + 4;
    let body: serde_json::Value = serde_json::from_str(&raw[body_start..]).unwrap();
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "SYSTEM RULES");
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 800);
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
}

#[tokio::test]
async fn gemini_error_does_not_leak_key() {
    let base = support::dead_address().await;
    let generator = GeminiGenerator::new("g-secret-key", TIMEOUT)
        .unwrap()
        .with_base_url(&base);

    let err = generator.generate(request()).await.unwrap_err();
    assert!(!err.to_string().contains("g-secret-key"), "{}", err);
}

// ── Full service over HTTP ───────────────────────────────────────────

#[tokio::test]
async fn service_over_http_returns_alternatives() {
    let model_text = "```json\n{\"alternatives\":[{\"label\":\"Tighter\",\"text\":\"We ship Friday.\"},{\"text\":\"Shipping is Friday.\"}]}\n```";
    let (base, _server) = support::serve_once(200, &anthropic_reply(model_text)).await;
    let generator = AnthropicGenerator::new("sk-test", TIMEOUT)
        .unwrap()
        .with_base_url(&base);
    let service = RewriteService::new(Box::new(generator), Settings::default());

    let body = json!({
        "action": "shorter",
        "selectedText": "We are going to be shipping the release on Friday."
    });
    let resp = service.handle(&body.to_string(), None).await;

    assert_eq!(resp.status, 200);
    assert_eq!(
        resp.body,
        json!({"alternatives": [
            {"label": "Tighter", "text": "We ship Friday."},
            {"label": "Option 2", "text": "Shipping is Friday."}
        ]})
    );
}

#[tokio::test]
async fn service_over_http_maps_upstream_failure() {
    let (base, _server) = support::serve_once(500, r#"{"error":"boom"}"#).await;
    let generator = GeminiGenerator::new("g-key", TIMEOUT)
        .unwrap()
        .with_base_url(&base);
    let service = RewriteService::new(Box::new(generator), Settings::default());

    let body = json!({"action": "fix", "selectedText": "teh cat"});
    let resp = service.handle(&body.to_string(), None).await;

    assert_eq!(resp.status, 502);
    assert_eq!(resp.body["error"], "upstream_error");
}

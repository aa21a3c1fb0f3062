//! Shared test helpers: a scripted generator and a one-shot HTTP stub.

#![allow(dead_code)]

use async_trait::async_trait;
use note_rewrite_lib::error::{Result, RewriteError};
use note_rewrite_lib::llm::{GenerationRequest, Generator};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// What the mock does when called.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(String),
    Status(u16),
    Unreachable,
    /// Never answers (for timeout tests under paused time).
    Hang,
}

/// A generate() call as the mock saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user_message: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

pub struct MockGenerator {
    script: Script,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockGenerator {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying(raw: &str) -> Self {
        Self::new(Script::Reply(raw.to_string()))
    }

    /// Handle to the call log that survives boxing the generator.
    pub fn calls(&self) -> Arc<Mutex<Vec<RecordedCall>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn id(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: request.system.to_string(),
            user_message: request.user_message.to_string(),
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        });
        match &self.script {
            Script::Reply(raw) => Ok(raw.clone()),
            Script::Status(status) => Err(RewriteError::Backend {
                status: *status,
                body: "stub failure".to_string(),
            }),
            Script::Unreachable => Err(RewriteError::Transport("connection refused".to_string())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }
}

/// Serve exactly one HTTP response on a random local port.
///
/// Returns the base URL and a handle resolving to the raw request text
/// (request line, headers and body) the client sent.
pub async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{}", addr), handle)
}

/// A local address nothing listens on.
pub async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return String::from_utf8_lossy(&buf).to_string();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buf).to_string()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

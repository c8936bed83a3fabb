//! Mock chat provider for integration tests
//!
//! Implements a minimal OpenAI-compatible `/chat/completions` endpoint that
//! replays scripted responses, one per request, and records the request
//! bodies it receives.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// One scripted response the mock serves for a single request
pub enum Scripted {
    /// SSE stream of the given chunk payloads, terminated by `[DONE]`
    Sse(Vec<serde_json::Value>),
    /// Plain-text body instead of an event stream
    Plain(String),
    /// Error status with a JSON body
    Error(u16, serde_json::Value),
}

/// Mock provider that replays scripted responses
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    scripts: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<serde_json::Value>>,
}

impl MockProvider {
    /// Start the mock server, returning immediately
    pub async fn start(scripts: Vec<Scripted>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Request bodies received so far, oldest first
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    Json(request): Json<serde_json::Value>,
) -> Response {
    state.requests.lock().unwrap().push(request);

    let script = state.scripts.lock().unwrap().pop_front();
    match script {
        Some(Scripted::Sse(chunks)) => {
            let mut body = String::new();
            for chunk in chunks {
                body.push_str(&format!("data: {chunk}\n\n"));
            }
            body.push_str("data: [DONE]\n\n");
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        Some(Scripted::Plain(text)) => {
            ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response()
        }
        Some(Scripted::Error(status, body)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(body)).into_response()
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": {"message": "mock provider received more requests than scripted"}
            })),
        )
            .into_response(),
    }
}

//! Transport layer: opening an event stream against the provider
//!
//! The session layer only depends on the [`ChatTransport`] trait, which
//! yields discrete SSE events and a terminal close/error signal;
//! [`HttpTransport`] is the reqwest-backed implementation.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use rivulet_config::ProviderConfig;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::ChatError;
use crate::protocol::{ChatRequest, ChatResponse};

/// SSE content type expected on a successful streaming response
const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// One server-sent event as produced by a transport
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Message payload
    pub data: String,
    /// Event name (empty for the default `message` type)
    pub event: String,
    /// Last event ID
    pub id: String,
    /// Server-requested reconnection delay
    pub retry: Option<Duration>,
}

/// Boxed stream of raw SSE events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<RawEvent, ChatError>> + Send>>;

/// Control-response metadata handed to the terminal callback
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,
    /// Response content type
    pub content_type: Option<String>,
}

/// Result of opening a connection
pub enum Opened {
    /// Provider acknowledged with an event stream
    Events {
        /// Control-response metadata
        meta: ResponseMeta,
        /// The event stream itself
        events: EventStream,
    },
    /// Provider answered with a plain-text body; the whole body is the answer
    Plain {
        /// Control-response metadata
        meta: ResponseMeta,
        /// Full response body
        body: String,
    },
}

/// Trait implemented by chat transports
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open a streaming connection for the given request
    async fn open(&self, request: &ChatRequest) -> Result<Opened, ChatError>;

    /// Send a non-streaming completion request, returning the answer text
    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError>;
}

/// HTTP/SSE transport over reqwest
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    search_base_url: Option<Url>,
    api_key: Option<SecretString>,
}

impl HttpTransport {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            search_base_url: config.search_base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Build the chat completions URL for the given model
    ///
    /// Search-suffixed models go to the search endpoint when configured.
    fn completions_url(&self, model: &str) -> String {
        let base = if model.ends_with("-Search") {
            self.search_base_url.as_ref().unwrap_or(&self.base_url)
        } else {
            &self.base_url
        };
        let base = base.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, ChatError> {
        let mut builder = self.client.post(self.completions_url(&request.model)).json(request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "request to provider failed");
            ChatError::Streaming(e.to_string())
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, request: &ChatRequest) -> Result<Opened, ChatError> {
        let mut wire = request.clone();
        wire.stream = Some(true);

        let response = self.send(&wire).await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let meta = ResponseMeta {
            status: status.as_u16(),
            content_type: content_type.clone(),
        };

        tracing::debug!(status = %status, content_type = ?content_type, "provider responded");

        if content_type.as_deref().unwrap_or_default().starts_with("text/plain") {
            let body = response.text().await.unwrap_or_default();
            return Ok(Opened::Plain { meta, body });
        }

        let is_event_stream = content_type
            .as_deref()
            .unwrap_or_default()
            .starts_with(EVENT_STREAM_CONTENT_TYPE);

        if !status.is_success() || !is_event_stream {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let events = response.bytes_stream().eventsource().map(|result| match result {
            Ok(event) => Ok(RawEvent {
                data: event.data,
                event: event.event,
                id: event.id,
                retry: event.retry,
            }),
            Err(e) => Err(ChatError::Streaming(e.to_string())),
        });

        Ok(Opened::Events {
            meta,
            events: Box::pin(events),
        })
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let mut wire = request.clone();
        wire.stream = None;

        let response = self.send(&wire).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Streaming(format!("failed to parse response: {e}")))?;

        Ok(parsed.message_text().to_owned())
    }
}

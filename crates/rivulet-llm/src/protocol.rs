//! Chat provider wire format types
//!
//! The provider speaks an OpenAI-compatible chat completion API extended
//! with `reasoning_content` deltas and, in search mode, injected
//! `search_results` / `search_indexes` payloads.

use serde::{Deserialize, Serialize};

use crate::types::{Message, ToolDefinition};

// -- Request types --

/// Chat completion request body
///
/// `max_tokens` is deliberately never sent; the provider picks its own
/// limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages, oldest first
    pub messages: Vec<Message>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Presence penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Frequency penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Tool definitions (omitted when empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
}

// -- Streaming types --

/// One parsed SSE message body
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    /// Delta choices; only `choices[0]` is meaningful for this provider
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

/// Choice within a streaming chunk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChoice {
    /// Incremental delta
    #[serde(default)]
    pub delta: StreamDelta,
    /// Reason generation finished; `"risky"` means recall the whole turn
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Delta content within a streaming choice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    /// Incremental answer text
    #[serde(default)]
    pub content: Option<String>,
    /// Incremental thinking text
    #[serde(default)]
    pub reasoning_content: Option<String>,
    /// Incremental tool calls
    #[serde(default)]
    pub tool_calls: Option<Vec<StreamToolCall>>,
    /// Injected search results (search mode only)
    #[serde(default)]
    pub search_results: Option<Vec<SearchResult>>,
    /// Injected citation indexes (search mode only)
    #[serde(default)]
    pub search_indexes: Option<Vec<SearchIndex>>,
}

/// Tool call fragment within a streaming delta
#[derive(Debug, Clone, Deserialize)]
pub struct StreamToolCall {
    /// Index within the assembled `tool_calls` array
    #[serde(default)]
    pub index: u32,
    /// Tool call ID (first fragment only)
    #[serde(default)]
    pub id: Option<String>,
    /// Tool type (first fragment only)
    #[serde(default, rename = "type")]
    pub call_type: Option<String>,
    /// Partial function call
    #[serde(default)]
    pub function: Option<StreamFunctionCall>,
}

/// Partial function call within a streaming tool call
#[derive(Debug, Clone, Deserialize)]
pub struct StreamFunctionCall {
    /// Function name (first fragment only)
    #[serde(default)]
    pub name: Option<String>,
    /// Incremental arguments JSON fragment
    #[serde(default)]
    pub arguments: Option<String>,
}

// -- Search payloads --

/// One web search result injected into the stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Source page URL
    pub url: String,
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Content excerpt
    #[serde(default)]
    pub snippet: String,
    /// Publication time, epoch milliseconds
    #[serde(default)]
    pub published_at: i64,
    /// Source site name
    #[serde(default)]
    pub site_name: String,
    /// Source site favicon URL
    #[serde(default)]
    pub site_icon: Option<String>,
    /// Citation number assigned by the provider, when present
    #[serde(default)]
    pub cite_index: Option<u32>,
}

/// Mapping from a source URL to its citation number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndex {
    /// Source page URL
    pub url: String,
    /// Citation number referenced from the answer text
    pub cite_index: u32,
}

// -- Non-streaming response types --

/// Chat completion response body (non-streaming)
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Generated choices
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ChatResponse {
    /// Text content of the first choice, if any
    pub fn message_text(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default()
    }
}

/// Choice within a non-streaming response
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Generated message
    pub message: ChoiceMessage,
}

/// Message within a response choice
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Text content
    #[serde(default)]
    pub content: Option<String>,
}

// -- Error body --

/// Provider error body, used for soft-error mapping
///
/// Some failures arrive as JSON fields with a 200-family status rather than
/// an HTTP error.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Provider-specific error code
    #[serde(default)]
    pub code: Option<i64>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

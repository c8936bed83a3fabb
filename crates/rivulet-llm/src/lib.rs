//! Provider wire protocol and stream classification for rivulet
//!
//! Consumes raw SSE payloads from an OpenAI-compatible chat provider that
//! interleaves answer text, reasoning text, tool-call fragments, and web
//! search payloads in one stream, and classifies each payload into exactly
//! one tagged [`Chunk`] for the session layer to route.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod classify;
pub mod diagnostic;
pub mod error;
pub mod protocol;
pub mod render;
pub mod transport;
pub mod types;

pub use classify::classify;
pub use error::ChatError;
pub use transport::{ChatTransport, EventStream, HttpTransport, Opened, RawEvent, ResponseMeta};
pub use types::{Chunk, FunctionCall, Message, Role, ToolCall, ToolCallFragment};

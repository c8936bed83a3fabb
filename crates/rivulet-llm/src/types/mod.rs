//! Canonical conversation and stream-classification types

pub mod chunk;
pub mod message;
pub mod tool;

pub use chunk::{Chunk, ToolCallFragment};
pub use message::{FunctionCall, Message, Role, ToolCall};
pub use tool::{FunctionDefinition, ToolDefinition};

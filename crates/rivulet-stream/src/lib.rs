//! Stream re-animation engine
//!
//! Takes the classified SSE chunks of a chat completion and turns them back
//! into a smooth, multi-channel display feed: a pacer meters text onto the
//! thinking, search, and answer channels, a tool-call accumulator reassembles
//! fragmented calls, and a session drives the whole request/tool/restart
//! loop until the provider finishes.

pub mod hooks;
pub mod pacer;
pub mod session;
pub mod tools;

pub use hooks::{ChatHooks, UpdateFn};
pub use pacer::{Channel, Drained, Pacer};
pub use session::{SessionOutcome, SessionState, SessionTiming, StreamSession};
pub use tools::{ChatTool, ToolCallAccumulator, ToolOutput, ToolRegistry, ToolReport};

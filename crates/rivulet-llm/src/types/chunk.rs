use crate::protocol::{SearchIndex, SearchResult};

/// One classified delta unit derived from a single SSE message
///
/// Exactly one interpretation applies per message; see
/// [`classify`](crate::classify::classify) for the priority order.
#[derive(Debug, Clone)]
pub enum Chunk {
    /// Incremental reasoning text
    Thinking(String),
    /// Incremental answer text
    Answer(String),
    /// Injected web search results, delivered in one piece
    SearchResults(Vec<SearchResult>),
    /// Citation index mapping, delivered immediately and never paced
    SearchIndexes(Vec<SearchIndex>),
    /// Tool call fragments, one per `tool_calls` entry
    ToolCalls(Vec<ToolCallFragment>),
    /// Provider asked to discard the whole turn
    Recall,
    /// Heartbeat with nothing to do
    Empty,
}

/// One streamed fragment of a tool call
///
/// The first fragment for an index carries the id, type, and function name;
/// later fragments only extend `arguments`.
#[derive(Debug, Clone)]
pub struct ToolCallFragment {
    /// Index within the assembled `tool_calls` array
    pub index: u32,
    /// Tool call ID (first fragment only)
    pub id: Option<String>,
    /// Tool type (first fragment only)
    pub call_type: Option<String>,
    /// Function name (first fragment only)
    pub name: Option<String>,
    /// Arguments fragment to concatenate
    pub arguments: String,
}

//! SSE payload classification
//!
//! Each raw SSE message body maps to exactly one [`Chunk`]. Classification
//! is order-sensitive: the recall signal and search payloads take priority
//! over text content.

use crate::protocol::{StreamChunk, StreamToolCall};
use crate::types::{Chunk, ToolCallFragment};

/// Literal marker the provider injects as answer content when the web
/// search step failed; routed to the search channel, never the answer.
pub const SEARCH_FAILED_MARKER: &str = "⚠️ Search Failed";

/// Classify one raw SSE message body
///
/// # Errors
///
/// Returns the JSON error if the payload is not a well-formed chunk; the
/// caller logs and skips such messages rather than aborting the stream.
pub fn classify(data: &str) -> Result<Chunk, serde_json::Error> {
    let chunk: StreamChunk = serde_json::from_str(data)?;
    Ok(classify_chunk(chunk))
}

/// Classify an already-parsed stream chunk
pub fn classify_chunk(chunk: StreamChunk) -> Chunk {
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Chunk::Empty;
    };

    if choice.finish_reason.as_deref() == Some("risky") {
        return Chunk::Recall;
    }

    let delta = choice.delta;

    if let Some(indexes) = delta.search_indexes {
        return Chunk::SearchIndexes(indexes);
    }

    if let Some(results) = delta.search_results {
        return Chunk::SearchResults(results);
    }

    if let Some(calls) = delta.tool_calls
        && !calls.is_empty()
    {
        return Chunk::ToolCalls(calls.into_iter().map(into_fragment).collect());
    }

    let reasoning = delta.reasoning_content.unwrap_or_default();
    let content = delta.content.unwrap_or_default();

    if reasoning.is_empty() && content.is_empty() {
        return Chunk::Empty;
    }

    if reasoning.is_empty() {
        Chunk::Answer(content)
    } else {
        Chunk::Thinking(reasoning)
    }
}

fn into_fragment(call: StreamToolCall) -> ToolCallFragment {
    let (name, arguments) = call
        .function
        .map(|f| (f.name, f.arguments.unwrap_or_default()))
        .unwrap_or_default();

    ToolCallFragment {
        index: call.index,
        id: call.id,
        call_type: call.call_type,
        name,
        arguments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_json(value: serde_json::Value) -> Chunk {
        classify(&value.to_string()).unwrap()
    }

    #[test]
    fn risky_finish_reason_is_recall() {
        let chunk = classify_json(serde_json::json!({
            "choices": [{"finish_reason": "risky", "delta": {"content": "already generated"}}]
        }));
        assert!(matches!(chunk, Chunk::Recall));
    }

    #[test]
    fn search_indexes_take_priority_over_content() {
        let chunk = classify_json(serde_json::json!({
            "choices": [{"delta": {
                "content": "text",
                "search_indexes": [{"url": "https://a.example", "cite_index": 1}]
            }}]
        }));
        let Chunk::SearchIndexes(indexes) = chunk else {
            panic!("expected search indexes");
        };
        assert_eq!(indexes[0].cite_index, 1);
    }

    #[test]
    fn search_results_classified() {
        let chunk = classify_json(serde_json::json!({
            "choices": [{"delta": {"search_results": [{
                "url": "https://a.example",
                "title": "A",
                "snippet": "s",
                "published_at": 1_739_664_306_000_i64,
                "site_name": "example"
            }]}}]
        }));
        let Chunk::SearchResults(results) = chunk else {
            panic!("expected search results");
        };
        assert_eq!(results.len(), 1);
        assert!(results[0].cite_index.is_none());
    }

    #[test]
    fn tool_call_fragments_one_per_entry() {
        let chunk = classify_json(serde_json::json!({
            "choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "a", "type": "function", "function": {"name": "f", "arguments": "{"}},
                {"index": 1, "id": "b", "type": "function", "function": {"name": "g"}}
            ]}}]
        }));
        let Chunk::ToolCalls(fragments) = chunk else {
            panic!("expected tool calls");
        };
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].arguments, "{");
        assert_eq!(fragments[1].name.as_deref(), Some("g"));
        assert_eq!(fragments[1].arguments, "");
    }

    #[test]
    fn reasoning_beats_content() {
        let chunk = classify_json(serde_json::json!({
            "choices": [{"delta": {"reasoning_content": "hmm", "content": ""}}]
        }));
        let Chunk::Thinking(text) = chunk else {
            panic!("expected thinking");
        };
        assert_eq!(text, "hmm");
    }

    #[test]
    fn content_only_is_answer() {
        let chunk = classify_json(serde_json::json!({
            "choices": [{"delta": {"content": "Hello"}}]
        }));
        let Chunk::Answer(text) = chunk else {
            panic!("expected answer");
        };
        assert_eq!(text, "Hello");
    }

    #[test]
    fn empty_delta_is_heartbeat() {
        let chunk = classify_json(serde_json::json!({"choices": [{"delta": {}}]}));
        assert!(matches!(chunk, Chunk::Empty));

        let chunk = classify_json(serde_json::json!({"choices": []}));
        assert!(matches!(chunk, Chunk::Empty));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(classify("not json").is_err());
    }
}

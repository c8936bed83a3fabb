//! Tool-call assembly and execution
//!
//! Tool calls arrive as streamed argument fragments keyed by index; the
//! accumulator assembles them into invokable records, and the executor runs
//! them against registered [`ChatTool`] implementations. Execution failure
//! is never fatal: every call yields a valid tool-response message so the
//! conversation can continue.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use rivulet_llm::types::{FunctionCall, ToolCall, ToolCallFragment};

/// Streamed tool call being assembled
///
/// Created by the first fragment carrying an id; later fragments for the
/// same index only extend `arguments`.
#[derive(Debug, Clone)]
struct PendingToolCall {
    id: String,
    call_type: String,
    name: String,
    arguments: String,
}

/// Assembles streamed tool-call fragments into complete calls
///
/// Driven sequentially by one session's event handling; needs no locking.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, PendingToolCall>,
}

impl ToolCallAccumulator {
    /// New, empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fragment into the assembly
    ///
    /// A fragment with an id seeds a new call at its index; one without an
    /// id extends the arguments of the call already at that index. An
    /// id-less fragment for an unknown index is dropped with a warning,
    /// since its argument text is unrecoverable.
    pub fn absorb(&mut self, fragment: ToolCallFragment) {
        if let Some(id) = fragment.id {
            self.calls.insert(
                fragment.index,
                PendingToolCall {
                    id,
                    call_type: fragment.call_type.unwrap_or_else(|| "function".to_owned()),
                    name: fragment.name.unwrap_or_default(),
                    arguments: fragment.arguments,
                },
            );
        } else if let Some(call) = self.calls.get_mut(&fragment.index) {
            call.arguments.push_str(&fragment.arguments);
        } else {
            tracing::warn!(index = fragment.index, "dropping tool-call fragment for unknown index");
        }
    }

    /// Whether any calls have been assembled
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Snapshot and clear, returning finalized calls in index order
    pub fn take_finished(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.calls)
            .into_values()
            .map(|call| ToolCall {
                id: call.id,
                call_type: call.call_type,
                function: FunctionCall {
                    name: call.name,
                    arguments: call.arguments,
                },
            })
            .collect()
    }
}

/// Result of invoking a tool, before coercion to message content
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// HTTP-style status; 300 and above is treated as failure
    pub status: u16,
    /// Payload returned by the tool
    pub data: serde_json::Value,
}

impl ToolOutput {
    /// Successful output with the given payload
    pub const fn ok(data: serde_json::Value) -> Self {
        Self { status: 200, data }
    }
}

/// An externally registered, side-effecting callable
#[async_trait]
pub trait ChatTool: Send + Sync {
    /// Name the provider addresses this tool by
    fn name(&self) -> &str;

    /// Invoke with the parsed arguments object
    async fn invoke(&self, arguments: serde_json::Value) -> anyhow::Result<ToolOutput>;
}

/// Registry of tools available to the session
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ChatTool>>,
}

impl ToolRegistry {
    /// New, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name
    pub fn register(&mut self, tool: Arc<dyn ChatTool>) {
        self.tools.insert(tool.name().to_owned(), tool);
    }

    /// Whether no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn get(&self, name: &str) -> Option<&Arc<dyn ChatTool>> {
        self.tools.get(name)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Settled outcome of one tool call
#[derive(Debug, Clone)]
pub struct ToolReport {
    /// The call that was executed
    pub call: ToolCall,
    /// Content for the tool-response message (result data or error text)
    pub content: String,
    /// Whether execution failed
    pub is_error: bool,
}

/// Execute one tool call, always yielding a report
///
/// Failure (unknown tool, bad arguments JSON, thrown error, or a status of
/// 300 and above) stringifies into the report content instead of
/// propagating.
pub async fn execute_call(registry: &ToolRegistry, call: ToolCall) -> ToolReport {
    let content = invoke(registry, &call).await;

    match content {
        Ok(content) => ToolReport {
            call,
            content,
            is_error: false,
        },
        Err(message) => {
            tracing::warn!(tool = %call.function.name, error = %message, "tool call failed");
            ToolReport {
                call,
                content: message,
                is_error: true,
            }
        }
    }
}

async fn invoke(registry: &ToolRegistry, call: &ToolCall) -> Result<String, String> {
    let Some(tool) = registry.get(&call.function.name) else {
        return Err(format!("unknown tool: {}", call.function.name));
    };

    let arguments = if call.function.arguments.trim().is_empty() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(&call.function.arguments)
            .map_err(|e| format!("invalid tool arguments: {e}"))?
    };

    let output = tool.invoke(arguments).await.map_err(|e| e.to_string())?;

    let content = match output.data {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };

    if output.status >= 300 {
        return Err(content);
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(index: u32, id: Option<&str>, name: Option<&str>, arguments: &str) -> ToolCallFragment {
        ToolCallFragment {
            index,
            id: id.map(str::to_owned),
            call_type: id.map(|_| "function".to_owned()),
            name: name.map(str::to_owned),
            arguments: arguments.to_owned(),
        }
    }

    struct EchoTool;

    #[async_trait]
    impl ChatTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(&self, arguments: serde_json::Value) -> anyhow::Result<ToolOutput> {
            Ok(ToolOutput::ok(arguments["text"].clone()))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl ChatTool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }

        async fn invoke(&self, _arguments: serde_json::Value) -> anyhow::Result<ToolOutput> {
            anyhow::bail!("boom")
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        registry
    }

    #[test]
    fn fragments_assemble_across_reads() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(fragment(0, Some("a"), Some("f"), "{\"x\":"));
        acc.absorb(fragment(0, None, None, "1}"));

        let calls = acc.take_finished();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "a");
        assert_eq!(calls[0].function.name, "f");
        assert_eq!(calls[0].function.arguments, "{\"x\":1}");
        assert!(acc.is_empty());
    }

    #[test]
    fn calls_returned_in_index_order() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(fragment(1, Some("b"), Some("g"), ""));
        acc.absorb(fragment(0, Some("a"), Some("f"), ""));

        let calls = acc.take_finished();
        assert_eq!(calls[0].id, "a");
        assert_eq!(calls[1].id, "b");
    }

    #[test]
    fn orphan_fragment_is_dropped() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(fragment(7, None, None, "lost"));
        assert!(acc.is_empty());
    }

    #[tokio::test]
    async fn string_data_passes_through_unquoted() {
        let call = ToolCall {
            id: "a".to_owned(),
            call_type: "function".to_owned(),
            function: FunctionCall {
                name: "echo".to_owned(),
                arguments: r#"{"text": "42"}"#.to_owned(),
            },
        };

        let report = execute_call(&registry(), call).await;
        assert!(!report.is_error);
        assert_eq!(report.content, "42");
    }

    #[tokio::test]
    async fn empty_arguments_parse_as_empty_object() {
        let call = ToolCall {
            id: "a".to_owned(),
            call_type: "function".to_owned(),
            function: FunctionCall {
                name: "echo".to_owned(),
                arguments: String::new(),
            },
        };

        let report = execute_call(&registry(), call).await;
        assert!(!report.is_error);
        // arguments["text"] is null when absent
        assert_eq!(report.content, "null");
    }

    #[tokio::test]
    async fn tool_failure_becomes_error_report_not_panic() {
        let call = ToolCall {
            id: "a".to_owned(),
            call_type: "function".to_owned(),
            function: FunctionCall {
                name: "failing".to_owned(),
                arguments: "{}".to_owned(),
            },
        };

        let report = execute_call(&registry(), call).await;
        assert!(report.is_error);
        assert_eq!(report.content, "boom");
    }

    #[tokio::test]
    async fn unknown_tool_reports_error() {
        let call = ToolCall {
            id: "a".to_owned(),
            call_type: "function".to_owned(),
            function: FunctionCall {
                name: "nope".to_owned(),
                arguments: "{}".to_owned(),
            },
        };

        let report = execute_call(&registry(), call).await;
        assert!(report.is_error);
        assert!(report.content.contains("unknown tool"));
    }
}

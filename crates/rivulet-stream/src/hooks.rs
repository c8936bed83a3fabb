//! Caller-facing callbacks for session progress and termination
//!
//! Mirrors the UI contract: per-channel update callbacks receive the full
//! committed text plus the just-drained fragment, tool callbacks bracket
//! each execution, and exactly one terminal callback fires per session.

use rivulet_llm::ChatError;
use rivulet_llm::protocol::SearchIndex;
use rivulet_llm::transport::ResponseMeta;
use rivulet_llm::types::ToolCall;

use crate::pacer::Channel;
use crate::tools::ToolReport;

/// Callback set supplied by the caller
///
/// All hooks are optional; unset hooks are skipped.
#[derive(Default)]
pub struct ChatHooks {
    /// Answer text progressed: (committed so far, just-drained fragment)
    pub on_update: Option<UpdateFn>,
    /// Thinking text progressed
    pub on_update_thinking: Option<UpdateFn>,
    /// Search text progressed
    pub on_update_search: Option<UpdateFn>,
    /// Citation indexes arrived (never paced)
    pub on_update_search_indexes: Option<Box<dyn FnMut(&[SearchIndex]) + Send>>,
    /// A tool call is about to execute
    pub on_before_tool: Option<Box<dyn FnMut(&ToolCall) + Send>>,
    /// A tool call settled, successfully or not
    pub on_after_tool: Option<Box<dyn FnMut(&ToolReport) + Send>>,
    /// Session finished; receives the final answer text and the last
    /// control-response metadata
    pub on_finish: Option<Box<dyn FnOnce(&str, Option<&ResponseMeta>) + Send>>,
    /// Session failed at the transport level
    pub on_error: Option<Box<dyn FnOnce(ChatError) + Send>>,
}

/// Per-channel text update callback
pub type UpdateFn = Box<dyn FnMut(&str, &str) + Send>;

impl ChatHooks {
    /// Dispatch a paced text update to the matching channel hook
    pub(crate) fn update(&mut self, channel: Channel, committed: &str, fragment: &str) {
        let hook = match channel {
            Channel::Search => &mut self.on_update_search,
            Channel::Thinking => &mut self.on_update_thinking,
            Channel::Answer => &mut self.on_update,
        };
        if let Some(hook) = hook {
            hook(committed, fragment);
        }
    }

    pub(crate) fn search_indexes(&mut self, indexes: &[SearchIndex]) {
        if let Some(hook) = &mut self.on_update_search_indexes {
            hook(indexes);
        }
    }

    pub(crate) fn before_tool(&mut self, call: &ToolCall) {
        if let Some(hook) = &mut self.on_before_tool {
            hook(call);
        }
    }

    pub(crate) fn after_tool(&mut self, report: &ToolReport) {
        if let Some(hook) = &mut self.on_after_tool {
            hook(report);
        }
    }

    /// Consume the finish hook; later calls are no-ops by construction
    pub(crate) fn finish(&mut self, text: &str, meta: Option<&ResponseMeta>) {
        if let Some(hook) = self.on_finish.take() {
            hook(text, meta);
        }
    }

    /// Consume the error hook
    pub(crate) fn error(&mut self, error: ChatError) {
        if let Some(hook) = self.on_error.take() {
            hook(error);
        }
    }
}

impl std::fmt::Debug for ChatHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHooks")
            .field("on_update", &self.on_update.is_some())
            .field("on_update_thinking", &self.on_update_thinking.is_some())
            .field("on_update_search", &self.on_update_search.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

//! Stream session orchestration
//!
//! A session owns one in-flight conversation turn: it opens a transport
//! connection, classifies each SSE event into the pacers and the tool-call
//! accumulator, executes pending tool calls when a stream ends, and
//! re-issues the request until the provider produces a final answer. The
//! tool-use loop is an explicit state transition, not recursion, so stack
//! depth stays bounded across arbitrarily long chains.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::future::join_all;
use rivulet_config::StreamConfig;
use rivulet_llm::ChatError;
use rivulet_llm::classify::{self, SEARCH_FAILED_MARKER};
use rivulet_llm::diagnostic::{self, RECALL_PLACEHOLDER, UNAUTHORIZED_NOTICE};
use rivulet_llm::protocol::ChatRequest;
use rivulet_llm::transport::{ChatTransport, Opened, ResponseMeta};
use rivulet_llm::types::{Chunk, Message};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::hooks::ChatHooks;
use crate::pacer::{Channel, Pacer};
use crate::tools::{ToolCallAccumulator, ToolRegistry, execute_call};

/// Literal event payload that terminates a stream
const DONE_SENTINEL: &str = "[DONE]";

/// Lifecycle of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport connection open, events flowing
    Streaming,
    /// Stream ended with pending tool calls; batch executing
    AwaitingToolResults,
    /// Waiting out the debounce delay before the next request
    Restarting,
    /// Stream ended with no pending tool calls
    Finished,
    /// Cancellation or timeout closed the session
    Aborted,
    /// Transport-level failure closed the session
    Errored,
}

impl SessionState {
    /// Whether the session can make no further progress
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Aborted | Self::Errored)
    }
}

/// Timeout and pacing knobs for a session
#[derive(Debug, Clone)]
pub struct SessionTiming {
    /// Window for the provider to acknowledge the connection
    pub connect_timeout: Duration,
    /// Window of event silence before the stream is abandoned
    pub idle_timeout: Duration,
    /// Debounce before re-issuing a request after a tool batch
    pub restart_delay: Duration,
    /// Interval between display-pacing ticks
    pub tick_interval: Duration,
}

impl From<&StreamConfig> for SessionTiming {
    fn from(config: &StreamConfig) -> Self {
        Self {
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            idle_timeout: Duration::from_millis(config.idle_timeout_ms),
            restart_delay: Duration::from_millis(config.restart_delay_ms),
            tick_interval: Duration::from_millis(config.tick_interval_ms),
        }
    }
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

/// Final state and accumulated channel text of a completed session
#[derive(Debug)]
pub struct SessionOutcome {
    /// Terminal state the session reached
    pub state: SessionState,
    /// Full answer text
    pub answer: String,
    /// Full thinking text
    pub thinking: String,
    /// Full search text
    pub search: String,
}

/// How a session left its request loop
enum Terminal {
    Finished,
    Aborted,
    /// Control response was not a usable event stream
    ControlFailure {
        status: u16,
        body: String,
    },
    /// The stream itself failed mid-flight
    StreamFailure(ChatError),
}

/// One in-flight conversation turn
pub struct StreamSession<T> {
    transport: Arc<T>,
    request: ChatRequest,
    tools: ToolRegistry,
    hooks: ChatHooks,
    timing: SessionTiming,
    cancel: CancellationToken,
    state: SessionState,
    pacer: Pacer,
    accumulator: ToolCallAccumulator,
    last_meta: Option<ResponseMeta>,
    /// Observability hook only: tracks thinking/answer mode flips
    last_was_thinking: bool,
}

impl<T: ChatTransport> StreamSession<T> {
    /// Build a session over the given transport and conversation
    ///
    /// The caller keeps the cancellation token; cancelling it aborts the
    /// session, which still flushes committed text and fires the terminal
    /// callback exactly once.
    pub fn new(
        transport: Arc<T>,
        request: ChatRequest,
        tools: ToolRegistry,
        hooks: ChatHooks,
        timing: SessionTiming,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            request,
            tools,
            hooks,
            timing,
            cancel,
            state: SessionState::Streaming,
            pacer: Pacer::new(),
            accumulator: ToolCallAccumulator::new(),
            last_meta: None,
            last_was_thinking: false,
        }
    }

    /// Drive the session to a terminal state
    ///
    /// Runs the request loop: stream, execute tools, restart, until the
    /// provider finishes or the session is cancelled or fails.
    pub async fn run(mut self) -> SessionOutcome {
        let cancel = self.cancel.clone();
        let mut ticker = tokio::time::interval(self.timing.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let terminal = 'cycle: loop {
            self.state = SessionState::Streaming;

            let opened = tokio::select! {
                () = cancel.cancelled() => break 'cycle Terminal::Aborted,
                opened = tokio::time::timeout(self.timing.connect_timeout, self.transport.open(&self.request)) => opened,
            };

            let opened = match opened {
                Err(_elapsed) => {
                    tracing::warn!("provider did not acknowledge within the connect window");
                    break 'cycle Terminal::Aborted;
                }
                Ok(Ok(opened)) => opened,
                Ok(Err(ChatError::Upstream { status, body })) => {
                    break 'cycle Terminal::ControlFailure { status, body };
                }
                Ok(Err(err)) => break 'cycle Terminal::StreamFailure(err),
            };

            let mut events = match opened {
                Opened::Plain { meta, body } => {
                    // The whole body is the answer; nothing to pace
                    self.last_meta = Some(meta);
                    self.pacer.set_answer(&body);
                    break 'cycle Terminal::Finished;
                }
                Opened::Events { meta, events } => {
                    self.last_meta = Some(meta);
                    events
                }
            };

            let idle = tokio::time::sleep(self.timing.idle_timeout);
            tokio::pin!(idle);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break 'cycle Terminal::Aborted,
                    _ = ticker.tick() => pump(&mut self.pacer, &mut self.hooks),
                    () = &mut idle => {
                        tracing::warn!("stream went silent past the idle window");
                        break 'cycle Terminal::Aborted;
                    }
                    next = events.next() => {
                        idle.as_mut().reset(Instant::now() + self.timing.idle_timeout);
                        match next {
                            None => break,
                            Some(Err(err)) => break 'cycle Terminal::StreamFailure(err),
                            Some(Ok(event)) => {
                                if event.data == DONE_SENTINEL {
                                    break;
                                }
                                self.handle_event(&event.data);
                            }
                        }
                    }
                }
            }
            drop(events);

            let calls = self.accumulator.take_finished();
            if calls.is_empty() {
                break 'cycle Terminal::Finished;
            }

            // Tool-use loop: execute the batch, then re-issue the request
            self.state = SessionState::AwaitingToolResults;
            tracing::debug!(count = calls.len(), "stream ended with pending tool calls");

            self.request.messages.push(Message::assistant_tool_calls(calls.clone()));
            for call in &calls {
                self.hooks.before_tool(call);
            }

            let batch = join_all(calls.into_iter().map(|call| execute_call(&self.tools, call)));
            tokio::pin!(batch);
            let reports = loop {
                tokio::select! {
                    () = cancel.cancelled() => break 'cycle Terminal::Aborted,
                    _ = ticker.tick() => pump(&mut self.pacer, &mut self.hooks),
                    reports = &mut batch => break reports,
                }
            };

            for report in reports {
                self.hooks.after_tool(&report);
                self.request.messages.push(Message::tool_response(
                    report.call.function.name,
                    report.content,
                    report.call.id,
                ));
            }

            self.state = SessionState::Restarting;
            let delay = tokio::time::sleep(self.timing.restart_delay);
            tokio::pin!(delay);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break 'cycle Terminal::Aborted,
                    _ = ticker.tick() => pump(&mut self.pacer, &mut self.hooks),
                    () = &mut delay => break,
                }
            }
        };

        self.finish(terminal)
    }

    /// Route one classified event into the pacers and the accumulator
    fn handle_event(&mut self, data: &str) {
        if data.trim().is_empty() {
            return;
        }

        let chunk = match classify::classify(data) {
            Ok(chunk) => chunk,
            Err(error) => {
                tracing::warn!(%error, data, "skipping unparseable SSE message");
                return;
            }
        };

        match chunk {
            Chunk::Recall => self.pacer.recall(RECALL_PLACEHOLDER),
            Chunk::SearchIndexes(indexes) => self.hooks.search_indexes(&indexes),
            Chunk::SearchResults(results) => {
                let rendered = rivulet_llm::render::render_search_results(&results);
                self.pacer.append(Channel::Search, &rendered);
            }
            Chunk::ToolCalls(fragments) => {
                for fragment in fragments {
                    self.accumulator.absorb(fragment);
                }
            }
            Chunk::Empty => {}
            Chunk::Thinking(text) => {
                self.note_mode(true);
                self.pacer.append(Channel::Thinking, &text);
            }
            Chunk::Answer(text) => {
                self.note_mode(false);
                if text.starts_with(SEARCH_FAILED_MARKER) {
                    // Failure notice belongs to the search channel and shows
                    // immediately, without pacing
                    self.hooks.update(Channel::Search, &text, &text);
                } else {
                    self.pacer.append(Channel::Answer, &text);
                }
            }
        }
    }

    fn note_mode(&mut self, thinking: bool) {
        if self.last_was_thinking != thinking {
            tracing::debug!(thinking, "stream switched between thinking and answer");
            self.last_was_thinking = thinking;
        }
    }

    /// Flush the pacers and fire the terminal callback exactly once
    fn finish(mut self, terminal: Terminal) -> SessionOutcome {
        if let Terminal::ControlFailure { status, body } = &terminal {
            let mut parts = Vec::new();

            let existing = self.pacer.total(Channel::Answer);
            if !existing.is_empty() {
                parts.push(existing);
            }
            if *status == 401 {
                parts.push(UNAUTHORIZED_NOTICE.to_owned());
            }
            let detail = diagnostic::pretty_error_body(body);
            if !detail.is_empty() {
                parts.push(detail);
            }

            self.pacer.set_answer(&parts.join("\n\n"));
            self.last_meta = Some(ResponseMeta {
                status: *status,
                content_type: None,
            });
        }

        self.pacer.flush();

        self.state = match terminal {
            Terminal::Finished => SessionState::Finished,
            Terminal::Aborted => SessionState::Aborted,
            Terminal::ControlFailure { .. } | Terminal::StreamFailure(_) => SessionState::Errored,
        };

        if let Terminal::StreamFailure(err) = terminal {
            self.hooks.error(err);
        } else if self.pacer.answer_is_empty() {
            self.hooks.error(ChatError::EmptyResponse);
        } else {
            let answer = self.pacer.committed(Channel::Answer).to_owned();
            self.hooks.finish(&answer, self.last_meta.as_ref());
        }

        SessionOutcome {
            state: self.state,
            answer: self.pacer.committed(Channel::Answer).to_owned(),
            thinking: self.pacer.committed(Channel::Thinking).to_owned(),
            search: self.pacer.committed(Channel::Search).to_owned(),
        }
    }
}

/// Run one pacing tick and dispatch the drained fragments
fn pump(pacer: &mut Pacer, hooks: &mut ChatHooks) {
    for drained in pacer.tick() {
        hooks.update(drained.channel, pacer.committed(drained.channel), &drained.fragment);
    }
}

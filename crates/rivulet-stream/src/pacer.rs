//! Display pacing for the three output channels
//!
//! Text arrives from the network in bursts; the pacer drains it at a bounded
//! rate per animation tick so the user sees typing rather than walls of
//! text. Channels drain in fixed priority order: citations first, then
//! reasoning, then the answer itself.

use std::mem;

/// Divisor controlling drain speed: a backlog converges in roughly this
/// many ticks regardless of size.
const DRAIN_DIVISOR: f64 = 60.0;

/// One of the three independent output text streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Rendered web-search citations
    Search,
    /// Model reasoning text
    Thinking,
    /// Final answer text
    Answer,
}

/// Text drained from one channel on one tick
#[derive(Debug)]
pub struct Drained {
    /// Channel the text belongs to
    pub channel: Channel,
    /// The just-drained fragment, already committed
    pub fragment: String,
}

/// Received-but-not-yet-shown text for one channel
///
/// Invariant: `committed` only grows, `pending` only shrinks, and their
/// concatenation equals everything ever appended.
#[derive(Debug, Default)]
struct ChannelBuffer {
    committed: String,
    pending: String,
}

impl ChannelBuffer {
    /// Move one tick's worth of characters from pending to committed
    ///
    /// Drains `max(1, round(pending_chars / 60))` characters, never
    /// splitting a UTF-8 scalar.
    fn drain(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }

        let pending_chars = self.pending.chars().count();
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let take = ((pending_chars as f64 / DRAIN_DIVISOR).round() as usize).max(1);

        let split = self
            .pending
            .char_indices()
            .nth(take)
            .map_or(self.pending.len(), |(at, _)| at);

        let rest = self.pending.split_off(split);
        let fragment = mem::replace(&mut self.pending, rest);
        self.committed.push_str(&fragment);
        Some(fragment)
    }

    /// Force-commit everything still pending
    fn force_flush(&mut self) {
        let pending = mem::take(&mut self.pending);
        self.committed.push_str(&pending);
    }

    fn is_fully_empty(&self) -> bool {
        self.committed.is_empty() && self.pending.is_empty()
    }
}

/// Display scheduler for the three output channels
#[derive(Debug, Default)]
pub struct Pacer {
    search: ChannelBuffer,
    thinking: ChannelBuffer,
    answer: ChannelBuffer,
    recalled: bool,
    flushed: bool,
}

impl Pacer {
    /// New pacer with empty channels
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue text for gradual display on the given channel
    ///
    /// Answer text is dropped once the turn has been recalled.
    pub fn append(&mut self, channel: Channel, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.recalled && channel == Channel::Answer {
            return;
        }
        self.buffer_mut(channel).pending.push_str(text);
    }

    /// Run one animation tick, draining channels in priority order
    ///
    /// A lower-priority channel only drains when every higher-priority
    /// channel's pending buffer is empty after this tick's drains, so
    /// citations always land before the reasoning and answer that cite
    /// them.
    pub fn tick(&mut self) -> Vec<Drained> {
        let mut drains = Vec::new();

        if let Some(fragment) = self.search.drain() {
            drains.push(Drained {
                channel: Channel::Search,
                fragment,
            });
        }

        if self.search.pending.is_empty()
            && let Some(fragment) = self.thinking.drain()
        {
            drains.push(Drained {
                channel: Channel::Thinking,
                fragment,
            });
        }

        if self.search.pending.is_empty()
            && self.thinking.pending.is_empty()
            && let Some(fragment) = self.answer.drain()
        {
            drains.push(Drained {
                channel: Channel::Answer,
                fragment,
            });
        }

        drains
    }

    /// Terminal flush: force-commit all pending text without pacing
    ///
    /// Idempotent; only the first call moves text, and returns `true`.
    pub fn flush(&mut self) -> bool {
        if self.flushed {
            return false;
        }
        self.flushed = true;
        self.search.force_flush();
        self.thinking.force_flush();
        self.answer.force_flush();
        true
    }

    /// Replace the answer with the recall placeholder and suppress any
    /// further answer accumulation
    pub fn recall(&mut self, placeholder: &str) {
        self.recalled = true;
        self.answer.pending.clear();
        self.answer.committed.clear();
        self.answer.committed.push_str(placeholder);
    }

    /// Overwrite the answer channel wholesale (diagnostic text)
    pub fn set_answer(&mut self, text: &str) {
        self.answer.pending.clear();
        self.answer.committed.clear();
        self.answer.committed.push_str(text);
    }

    /// Committed (already shown) text for a channel
    pub fn committed(&self, channel: Channel) -> &str {
        &self.buffer(channel).committed
    }

    /// Whether the answer channel never received any text
    pub fn answer_is_empty(&self) -> bool {
        self.answer.is_fully_empty()
    }

    /// Committed plus pending text for a channel
    pub fn total(&self, channel: Channel) -> String {
        let buffer = self.buffer(channel);
        let mut all = buffer.committed.clone();
        all.push_str(&buffer.pending);
        all
    }

    const fn buffer(&self, channel: Channel) -> &ChannelBuffer {
        match channel {
            Channel::Search => &self.search,
            Channel::Thinking => &self.thinking,
            Channel::Answer => &self.answer,
        }
    }

    const fn buffer_mut(&mut self, channel: Channel) -> &mut ChannelBuffer {
        match channel {
            Channel::Search => &mut self.search,
            Channel::Thinking => &mut self.thinking,
            Channel::Answer => &mut self.answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_all(pacer: &mut Pacer, max_ticks: usize) -> usize {
        for n in 0..max_ticks {
            if pacer.tick().is_empty() {
                return n;
            }
        }
        max_ticks
    }

    #[test]
    fn interleaved_appends_commit_exactly_once_per_channel() {
        let mut pacer = Pacer::new();
        pacer.append(Channel::Thinking, "let me ");
        pacer.append(Channel::Answer, "Hello");
        pacer.append(Channel::Thinking, "think");
        pacer.append(Channel::Answer, ", world");

        drain_all(&mut pacer, 10_000);

        assert_eq!(pacer.committed(Channel::Thinking), "let me think");
        assert_eq!(pacer.committed(Channel::Answer), "Hello, world");
        assert_eq!(pacer.committed(Channel::Search), "");
    }

    #[test]
    fn search_pending_blocks_lower_channels() {
        let mut pacer = Pacer::new();
        // Large enough that one tick cannot drain it to empty
        pacer.append(Channel::Search, &"s".repeat(600));
        pacer.append(Channel::Thinking, "t");
        pacer.append(Channel::Answer, "a");

        let drains = pacer.tick();
        assert_eq!(drains.len(), 1);
        assert_eq!(drains[0].channel, Channel::Search);
    }

    #[test]
    fn one_tick_can_fall_through_once_higher_channels_empty() {
        let mut pacer = Pacer::new();
        pacer.append(Channel::Search, "s");
        pacer.append(Channel::Answer, "a");

        // Single-char search pending drains fully, so the same tick may
        // proceed to the answer channel.
        let drains = pacer.tick();
        let channels: Vec<Channel> = drains.iter().map(|d| d.channel).collect();
        assert_eq!(channels, vec![Channel::Search, Channel::Answer]);
    }

    #[test]
    fn larger_backlogs_drain_faster() {
        let mut small = Pacer::new();
        small.append(Channel::Answer, &"x".repeat(10));
        let mut large = Pacer::new();
        large.append(Channel::Answer, &"x".repeat(10_000));

        let small_first = small.tick().pop().unwrap().fragment.chars().count();
        let large_first = large.tick().pop().unwrap().fragment.chars().count();

        assert_eq!(small_first, 1);
        assert!(large_first > 100);
    }

    #[test]
    fn drain_respects_utf8_boundaries() {
        let mut pacer = Pacer::new();
        pacer.append(Channel::Answer, "héllo wörld ① ②");

        let mut collected = String::new();
        for _ in 0..10_000 {
            let drains = pacer.tick();
            if drains.is_empty() {
                break;
            }
            for drained in drains {
                collected.push_str(&drained.fragment);
            }
        }

        assert_eq!(collected, "héllo wörld ① ②");
    }

    #[test]
    fn convergence_is_bounded() {
        let mut pacer = Pacer::new();
        pacer.append(Channel::Answer, &"x".repeat(6000));

        // Geometric decay plus the one-char floor keeps convergence well
        // under the backlog length.
        let ticks = drain_all(&mut pacer, 6000);
        assert!(ticks < 500, "took {ticks} ticks");
        assert_eq!(pacer.committed(Channel::Answer).len(), 6000);
    }

    #[test]
    fn flush_is_idempotent() {
        let mut pacer = Pacer::new();
        pacer.append(Channel::Answer, "partial");
        pacer.tick();

        assert!(pacer.flush());
        let after_first = pacer.committed(Channel::Answer).to_owned();
        assert_eq!(after_first, "partial");

        assert!(!pacer.flush());
        assert_eq!(pacer.committed(Channel::Answer), after_first);
    }

    #[test]
    fn recall_overrides_and_suppresses_answer() {
        let mut pacer = Pacer::new();
        pacer.append(Channel::Answer, "something rude");
        pacer.tick();

        pacer.recall("let's change topics");
        pacer.append(Channel::Answer, "more text");
        pacer.flush();

        assert_eq!(pacer.committed(Channel::Answer), "let's change topics");
        // Other channels keep flowing
        assert!(!pacer.answer_is_empty());
    }

    #[test]
    fn empty_answer_detected_after_flush() {
        let mut pacer = Pacer::new();
        pacer.append(Channel::Thinking, "only thinking");
        pacer.flush();

        assert!(pacer.answer_is_empty());
    }
}

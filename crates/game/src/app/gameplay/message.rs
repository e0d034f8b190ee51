use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::debug;

pub(crate) const DEFAULT_MESSAGE_DURATION_SECS: f32 = 2.0;
pub(crate) const DEFAULT_MESSAGE_SIZE: u16 = 32;

/// A line of text for the player. Unset duration and size fall back to the board defaults.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Message {
    pub(crate) text: String,
    pub(crate) duration_secs: Option<f32>,
    pub(crate) size: Option<u16>,
    pub(crate) enqueue: bool,
}

impl Message {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            duration_secs: None,
            size: None,
            enqueue: false,
        }
    }

    /// Waits behind the current message instead of replacing it.
    pub(crate) fn queued(mut self) -> Self {
        self.enqueue = true;
        self
    }

    pub(crate) fn with_duration(mut self, duration_secs: f32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }
}

pub(crate) trait MessageSink {
    fn show(&self, message: Message);
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DisplayedMessage {
    pub(crate) text: String,
    pub(crate) size: u16,
}

#[derive(Debug)]
struct ActiveMessage {
    shown: DisplayedMessage,
    expires_at: f64,
}

#[derive(Debug)]
struct BoardState {
    now: f64,
    current: Option<ActiveMessage>,
    queue: VecDeque<Message>,
}

/// Timed message display with a FIFO of pending messages.
#[derive(Debug)]
pub(crate) struct MessageBoard {
    default_duration_secs: f32,
    default_size: u16,
    state: RefCell<BoardState>,
}

impl Default for MessageBoard {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_DURATION_SECS, DEFAULT_MESSAGE_SIZE)
    }
}

impl MessageBoard {
    pub(crate) fn new(default_duration_secs: f32, default_size: u16) -> Self {
        Self {
            default_duration_secs,
            default_size,
            state: RefCell::new(BoardState {
                now: 0.0,
                current: None,
                queue: VecDeque::new(),
            }),
        }
    }

    pub(crate) fn advance(&self, dt_seconds: f32) {
        let mut state = self.state.borrow_mut();
        state.now += dt_seconds.max(0.0) as f64;
        let expired = state
            .current
            .as_ref()
            .is_some_and(|active| state.now >= active.expires_at);
        if !expired {
            return;
        }
        state.current = None;
        if let Some(next) = state.queue.pop_front() {
            let now = state.now;
            state.current = Some(self.activate(next, now));
        }
    }

    pub(crate) fn current(&self) -> Option<DisplayedMessage> {
        self.state
            .borrow()
            .current
            .as_ref()
            .map(|active| active.shown.clone())
    }

    #[cfg(test)]
    pub(crate) fn queued_len(&self) -> usize {
        self.state.borrow().queue.len()
    }

    fn activate(&self, message: Message, now: f64) -> ActiveMessage {
        let duration = message
            .duration_secs
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .unwrap_or(self.default_duration_secs);
        debug!(text = message.text.as_str(), duration, "message_shown");
        ActiveMessage {
            shown: DisplayedMessage {
                text: message.text,
                size: message.size.unwrap_or(self.default_size),
            },
            expires_at: now + duration as f64,
        }
    }
}

impl MessageSink for MessageBoard {
    fn show(&self, message: Message) {
        let mut state = self.state.borrow_mut();
        if message.enqueue && state.current.is_some() {
            state.queue.push_back(message);
            return;
        }
        let now = state.now;
        state.current = Some(self.activate(message, now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_text(board: &MessageBoard) -> Option<String> {
        board.current().map(|shown| shown.text)
    }

    #[test]
    fn message_expires_after_its_duration() {
        let board = MessageBoard::default();
        board.show(Message::new("hello"));

        board.advance(1.9);
        assert_eq!(current_text(&board).as_deref(), Some("hello"));
        board.advance(0.2);
        assert_eq!(current_text(&board), None);
    }

    #[test]
    fn queued_messages_drain_one_at_a_time() {
        let board = MessageBoard::default();
        board.show(Message::new("first").queued());
        board.show(Message::new("second").queued());
        board.show(Message::new("third").queued());

        assert_eq!(current_text(&board).as_deref(), Some("first"));
        assert_eq!(board.queued_len(), 2);

        board.advance(2.0);
        assert_eq!(current_text(&board).as_deref(), Some("second"));
        board.advance(2.0);
        assert_eq!(current_text(&board).as_deref(), Some("third"));
        board.advance(2.0);
        assert_eq!(current_text(&board), None);
    }

    #[test]
    fn unqueued_message_replaces_current_but_keeps_queue() {
        let board = MessageBoard::default();
        board.show(Message::new("intro").queued());
        board.show(Message::new("later").queued());
        board.show(Message::new("now"));

        assert_eq!(current_text(&board).as_deref(), Some("now"));
        assert_eq!(board.queued_len(), 1);
    }

    #[test]
    fn explicit_duration_and_default_size_apply() {
        let board = MessageBoard::new(2.0, 40);
        board.show(Message::new("long").with_duration(5.0));

        board.advance(4.0);
        let shown = board.current().expect("still shown");
        assert_eq!(shown.size, 40);
        board.advance(1.0);
        assert!(board.current().is_none());
    }
}

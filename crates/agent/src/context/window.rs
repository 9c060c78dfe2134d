//! Recency window — bounded FIFO of the most recent raw messages.
//!
//! The capacity is a whole number of user/assistant pairs so prompt
//! degradation can drop history turn by turn.

use contextclaw_core::message::Message;
use std::collections::VecDeque;

/// Default capacity: three user/assistant turn pairs.
pub const DEFAULT_WINDOW_CAPACITY: usize = 6;

/// The last few raw messages of a conversation, oldest first.
#[derive(Debug, Clone)]
pub struct RecencyWindow {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl RecencyWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Push messages to the tail, then evict from the head down to capacity.
    pub fn append<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = Message>,
    {
        for message in messages {
            self.messages.push_back(message);
            if self.messages.len() > self.capacity {
                self.messages.pop_front();
            }
        }
    }

    /// The last `n` messages (fewer if the window holds fewer), in order.
    pub fn slice(&self, n: usize) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(start).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

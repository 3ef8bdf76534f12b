//! Ordered transcript of a single conversation.
//!
//! The conversation only grows: messages are appended, placeholders are
//! patched in place while streaming, and the whole list is replaced on a
//! reset. Nothing is ever reordered or removed individually.

use chrono::Utc;

use crate::core::message::{Message, MessageId};

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// A conversation opened by a single model-authored message.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut conversation = Self::default();
        conversation.reset(greeting);
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|msg| msg.id == id)
    }

    /// The placeholder currently receiving fragments, if any.
    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|msg| msg.is_streaming)
    }

    /// Discard every message and start over with one model message.
    pub fn reset(&mut self, greeting: impl Into<String>) {
        self.messages.clear();
        let timestamp = self.next_timestamp();
        self.messages.push(Message::model(greeting, timestamp));
    }

    /// Append the user's message followed by an empty streaming placeholder.
    ///
    /// Returns the placeholder id, or `None` when another placeholder is
    /// still streaming.
    pub fn push_exchange(&mut self, user_text: impl Into<String>) -> Option<MessageId> {
        if self.streaming_message().is_some() {
            return None;
        }

        let user_timestamp = self.next_timestamp();
        self.messages.push(Message::user(user_text, user_timestamp));

        let placeholder = Message::placeholder(self.next_timestamp());
        let id = placeholder.id;
        self.messages.push(placeholder);
        Some(id)
    }

    /// Append a fragment to a streaming placeholder.
    pub fn append_fragment(&mut self, id: MessageId, fragment: &str) -> bool {
        match self.streaming_mut(id) {
            Some(msg) => {
                msg.content.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// Freeze a placeholder with the content it accumulated.
    pub fn complete(&mut self, id: MessageId) -> bool {
        match self.streaming_mut(id) {
            Some(msg) => {
                msg.is_streaming = false;
                true
            }
            None => false,
        }
    }

    /// Replace a placeholder's content with `error_text` and mark it failed.
    pub fn fail(&mut self, id: MessageId, error_text: &str) -> bool {
        match self.streaming_mut(id) {
            Some(msg) => {
                msg.content = error_text.to_string();
                msg.is_error = true;
                msg.is_streaming = false;
                true
            }
            None => false,
        }
    }

    fn streaming_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|msg| msg.id == id && msg.is_streaming)
    }

    fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        match self.messages.last() {
            Some(last) if last.timestamp >= now => last.timestamp + 1,
            _ => now,
        }
    }
}

//! The streaming consumer: owns the conversation, the adapter, and the
//! per-turn state machine that turns reply fragments into message updates.
//!
//! Each accepted submission moves through `Idle -> Streaming -> Idle`:
//! the user message and an empty placeholder are appended together, the
//! placeholder grows with every fragment, and the turn ends either with the
//! placeholder frozen (success) or replaced by [`ERROR_REPLY`] (failure).
//! At most one turn is in flight at a time.

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::chat_stream::StreamMessage;
use crate::core::constants::{switched_model_message, ERROR_REPLY, WELCOME_MESSAGE};
use crate::core::conversation::Conversation;
use crate::core::message::{Message, MessageId};
use crate::core::models::ModelId;
use crate::core::session::{failed_stream, ChatAdapter, ChatError, FragmentStream};

/// Observable state published after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub revision: u64,
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub model: ModelId,
}

/// A reply whose fragments still have to be consumed.
pub struct ActiveReply {
    pub stream_id: u64,
    pub cancel_token: CancellationToken,
    pub fragments: FragmentStream,
}

struct InFlight {
    stream_id: u64,
    placeholder_id: MessageId,
    cancel_token: CancellationToken,
}

pub struct MessageStore {
    conversation: Conversation,
    adapter: Box<dyn ChatAdapter>,
    model: ModelId,
    in_flight: Option<InFlight>,
    next_stream_id: u64,
    revision: u64,
    updates: watch::Sender<Snapshot>,
}

impl MessageStore {
    /// Start a session for `model` and open the conversation with the
    /// welcome message.
    pub fn new(mut adapter: Box<dyn ChatAdapter>, model: ModelId) -> Self {
        adapter.start(model);
        let conversation = Conversation::with_greeting(WELCOME_MESSAGE);
        let (updates, _) = watch::channel(Snapshot {
            revision: 0,
            messages: conversation.messages().to_vec(),
            is_loading: false,
            model,
        });

        Self {
            conversation,
            adapter,
            model,
            in_flight: None,
            next_stream_id: 0,
            revision: 0,
            updates,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[cfg(test)]
    fn is_current_stream(&self, stream_id: u64) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|flight| flight.stream_id == stream_id)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.updates.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    /// Accept `input` as the next user turn.
    ///
    /// Returns `None` without touching any state when the input is blank or
    /// a reply is already in flight. Otherwise appends the user message and
    /// the placeholder in one update and hands back the reply to consume.
    pub fn submit(&mut self, input: &str) -> Option<ActiveReply> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        if self.is_loading() {
            debug!("ignoring submission while a reply is in flight");
            return None;
        }

        let placeholder_id = self.conversation.push_exchange(text)?;

        self.next_stream_id += 1;
        let stream_id = self.next_stream_id;
        let cancel_token = CancellationToken::new();
        self.in_flight = Some(InFlight {
            stream_id,
            placeholder_id,
            cancel_token: cancel_token.clone(),
        });
        self.publish();

        let fragments = self
            .adapter
            .stream_reply(text)
            .unwrap_or_else(failed_stream);
        info!(stream_id, model = %self.model, "reply stream started");

        Some(ActiveReply {
            stream_id,
            cancel_token,
            fragments,
        })
    }

    /// Apply one event of a dispatched reply. Events for any stream other
    /// than the one in flight are ignored. Returns whether state changed.
    pub fn apply_stream_message(&mut self, stream_id: u64, message: StreamMessage) -> bool {
        let Some(placeholder_id) = self
            .in_flight
            .as_ref()
            .filter(|flight| flight.stream_id == stream_id)
            .map(|flight| flight.placeholder_id)
        else {
            debug!(stream_id, "dropping event for stale stream");
            return false;
        };

        match message {
            StreamMessage::Chunk(fragment) => {
                if self.conversation.append_fragment(placeholder_id, &fragment) {
                    self.publish();
                    true
                } else {
                    false
                }
            }
            StreamMessage::End => {
                self.conversation.complete(placeholder_id);
                self.finish_turn();
                info!(stream_id, "reply stream completed");
                true
            }
            StreamMessage::Error(error) => {
                warn!(stream_id, %error, "reply stream failed");
                self.conversation.fail(placeholder_id, ERROR_REPLY);
                self.finish_turn();
                true
            }
        }
    }

    /// Consume `reply` on the current task until it ends or fails.
    pub async fn drive(&mut self, reply: ActiveReply) -> Result<(), ChatError> {
        self.drive_with(reply, |_| {}).await
    }

    /// Like [`MessageStore::drive`], calling `on_fragment` with every
    /// fragment after it has been applied.
    pub async fn drive_with<F>(&mut self, reply: ActiveReply, mut on_fragment: F) -> Result<(), ChatError>
    where
        F: FnMut(&str),
    {
        let ActiveReply {
            stream_id,
            mut fragments,
            ..
        } = reply;

        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    on_fragment(&fragment);
                    self.apply_stream_message(stream_id, StreamMessage::Chunk(fragment));
                }
                Err(err) => {
                    self.apply_stream_message(stream_id, StreamMessage::Error(err.to_string()));
                    return Err(err);
                }
            }
        }
        self.apply_stream_message(stream_id, StreamMessage::End);
        Ok(())
    }

    /// Submit `input` and stream the reply in place. Returns `false` when
    /// the submission was rejected. A failed reply still counts as sent; it
    /// ends up as an error message in the conversation.
    pub async fn send(&mut self, input: &str) -> bool {
        match self.submit(input) {
            Some(reply) => {
                let _ = self.drive(reply).await;
                true
            }
            None => false,
        }
    }

    /// Replace the conversation with a fresh welcome and a fresh session.
    pub fn new_chat(&mut self) {
        self.cancel_in_flight();
        self.conversation.reset(WELCOME_MESSAGE);
        self.adapter.reset(self.model);
        info!(model = %self.model, "new chat");
        self.publish();
    }

    /// Switch to `model`, resetting the conversation and session. Switching
    /// to the active model does nothing and returns `false`.
    pub fn switch_model(&mut self, model: ModelId) -> bool {
        if model == self.model {
            return false;
        }

        self.cancel_in_flight();
        self.model = model;
        self.conversation
            .reset(switched_model_message(model.as_str()));
        self.adapter.reset(model);
        info!(model = %model, "switched model");
        self.publish();
        true
    }

    fn cancel_in_flight(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            debug!(stream_id = flight.stream_id, "cancelling in-flight reply");
            flight.cancel_token.cancel();
        }
    }

    fn finish_turn(&mut self) {
        self.in_flight = None;
        self.publish();
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.updates.send_replace(Snapshot {
            revision: self.revision,
            messages: self.conversation.messages().to_vec(),
            is_loading: self.is_loading(),
            model: self.model,
        });
    }
}

//! Session handles and the adapter seam between the message store and a
//! remote model.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::stream::{self, BoxStream, StreamExt};
use thiserror::Error;

use crate::api::{Content, GenerateContentRequest};
use crate::core::constants::SYSTEM_INSTRUCTION;
use crate::core::models::ModelId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Streaming was requested before any session existed.
    #[error("chat session not initialized")]
    SessionNotInitialized,

    /// The request failed, the remote answered with an error, or the stream
    /// broke off mid-reply.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ChatError {
    pub fn transport(message: impl Into<String>) -> Self {
        ChatError::Transport(message.into())
    }
}

/// Lazy, single-pass sequence of reply fragments. Ends after the first error.
pub type FragmentStream = BoxStream<'static, Result<String, ChatError>>;

/// A fragment stream that fails immediately with `error`.
pub fn failed_stream(error: ChatError) -> FragmentStream {
    stream::once(async move { Err::<String, ChatError>(error) }).boxed()
}

/// Owns the session with a remote model on behalf of one conversation.
pub trait ChatAdapter: Send {
    /// Create a fresh session bound to `model`, discarding any prior one.
    fn start(&mut self, model: ModelId);

    /// Send `user_text` to the active session. Nothing goes over the wire
    /// until the returned stream is polled.
    fn stream_reply(&mut self, user_text: &str) -> Result<FragmentStream, ChatError>;

    /// Model of the active session, if one exists.
    fn model(&self) -> Option<ModelId>;

    fn reset(&mut self, model: ModelId) {
        self.start(model);
    }
}

/// Completed turns replayed to the remote API with each request.
///
/// Cloning shares the same history; a new session always gets a new one,
/// so streams from a replaced session can only write into the orphaned copy.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    turns: Arc<Mutex<Vec<Content>>>,
}

impl SessionHistory {
    pub fn contents(&self) -> Vec<Content> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn record_exchange(&self, user: Content, reply: Content) {
        let mut turns = self.lock();
        turns.push(user);
        turns.push(reply);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Content>> {
        self.turns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Conversational context tied to one model and the fixed system instruction.
#[derive(Debug, Clone)]
pub struct ChatSession {
    model: ModelId,
    system_instruction: String,
    history: SessionHistory,
}

impl ChatSession {
    pub fn new(model: ModelId) -> Self {
        Self {
            model,
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            history: SessionHistory::default(),
        }
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Request carrying the recorded history followed by `user_text`.
    pub fn build_request(&self, user_text: &str) -> GenerateContentRequest {
        let mut contents = self.history.contents();
        contents.push(Content::user(user_text));
        GenerateContentRequest {
            contents,
            system_instruction: Some(Content::instruction(self.system_instruction.clone())),
        }
    }
}

/// Wrap `inner` so that a stream which ends without error records the
/// exchange into `history`.
pub fn record_on_success(
    inner: FragmentStream,
    history: SessionHistory,
    user_text: String,
) -> FragmentStream {
    struct Recorder {
        inner: FragmentStream,
        reply: String,
        pending: Option<(SessionHistory, String)>,
    }

    let state = Recorder {
        inner,
        reply: String::new(),
        pending: Some((history, user_text)),
    };

    stream::unfold(state, |mut state| async move {
        match state.inner.next().await {
            Some(Ok(fragment)) => {
                state.reply.push_str(&fragment);
                Some((Ok(fragment), state))
            }
            Some(Err(err)) => {
                state.pending = None;
                Some((Err(err), state))
            }
            None => {
                if let Some((history, user_text)) = state.pending.take() {
                    history.record_exchange(
                        Content::user(user_text),
                        Content::model(std::mem::take(&mut state.reply)),
                    );
                }
                None
            }
        }
    })
    .boxed()
}

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_util::stream::{self, StreamExt};

use crate::core::message::Message;
use crate::core::models::ModelId;
use crate::core::session::{ChatAdapter, ChatError, FragmentStream};

/// One canned reply: fragments yielded in order, optionally followed by an
/// error that ends the stream.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    pub fragments: Vec<String>,
    pub error: Option<ChatError>,
}

impl ScriptedReply {
    pub fn fragments(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            error: None,
        }
    }

    pub fn failing(fragments: &[&str], error: ChatError) -> Self {
        Self {
            error: Some(error),
            ..Self::fragments(fragments)
        }
    }

    fn into_stream(self) -> FragmentStream {
        let items = self
            .fragments
            .into_iter()
            .map(Ok)
            .chain(self.error.map(Err));
        stream::iter(items.collect::<Vec<_>>()).boxed()
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: VecDeque<ScriptedReply>,
    started: Vec<ModelId>,
    sent: Vec<String>,
    session: Option<ModelId>,
}

/// In-memory [`ChatAdapter`] that plays back scripted replies and records
/// every call. Clones share state so a test can inspect the adapter after
/// handing a boxed copy to the store.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAdapter {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedAdapter {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        let adapter = Self::default();
        adapter.state.lock().unwrap().replies = replies.into();
        adapter
    }

    pub fn started_models(&self) -> Vec<ModelId> {
        self.state.lock().unwrap().started.clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Forget the active session so the next send fails as uninitialized.
    pub fn drop_session(&self) {
        self.state.lock().unwrap().session = None;
    }
}

impl ChatAdapter for ScriptedAdapter {
    fn start(&mut self, model: ModelId) {
        let mut state = self.state.lock().unwrap();
        state.started.push(model);
        state.session = Some(model);
    }

    fn stream_reply(&mut self, user_text: &str) -> Result<FragmentStream, ChatError> {
        let mut state = self.state.lock().unwrap();
        if state.session.is_none() {
            return Err(ChatError::SessionNotInitialized);
        }
        state.sent.push(user_text.to_string());
        let reply = state
            .replies
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::fragments(&[]));
        Ok(reply.into_stream())
    }

    fn model(&self) -> Option<ModelId> {
        self.state.lock().unwrap().session
    }
}

pub fn create_test_messages() -> Vec<Message> {
    vec![
        Message::model("Welcome", 1),
        Message::user("Hello", 2),
        Message::model("Hi there!", 3),
        Message::user("How are you?", 4),
        Message::model("I'm doing well, thank you for asking!", 5),
    ]
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MessageId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry of the conversation transcript.
///
/// User messages are final from creation. Model messages are either final
/// (welcome/announcement text) or placeholders that stay mutable while
/// `is_streaming` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch; strictly increasing within a conversation.
    pub timestamp: i64,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp,
            is_streaming: false,
            is_error: false,
        }
    }

    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(Role::User, content, timestamp)
    }

    pub fn model(content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(Role::Model, content, timestamp)
    }

    pub fn placeholder(timestamp: i64) -> Self {
        Self {
            is_streaming: true,
            ..Self::new(Role::Model, String::new(), timestamp)
        }
    }

    /// A placeholder that has not received its first fragment yet.
    pub fn is_awaiting_first_fragment(&self) -> bool {
        self.is_streaming && self.content.is_empty()
    }
}

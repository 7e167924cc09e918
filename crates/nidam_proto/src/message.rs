//! Plaintext message types (what gets sealed inside a container).

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::ShareError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    System,
}

/// One chat message as the chat store records it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    #[serde(default)]
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
}

impl Message {
    pub fn user(id: u64, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id,
            text: text.into(),
            sender: Sender::User,
            timestamp,
        }
    }

    pub fn system(id: u64, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id,
            text: text.into(),
            sender: Sender::System,
            timestamp,
        }
    }
}

/// Ordered message sequence. Serialised as a bare JSON array so that
/// exports stay readable by the chat front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Canonical plaintext bytes: compact JSON, fields in declaration order.
    pub fn to_canonical_bytes(&self) -> Result<Zeroizing<Vec<u8>>, ShareError> {
        serde_json::to_vec(self)
            .map(Zeroizing::new)
            .map_err(|e| ShareError::Serialisation(e.to_string()))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self::new(messages)
    }
}

impl FromIterator<Message> for Conversation {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

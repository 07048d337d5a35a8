//! This module contains the chat events exchanged through the hub and their wire encoding.

use crate::error::ChatError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// An encoded message ready to be written to a connection.
///
/// Encoded once per broadcast and shared by every recipient's queue.
pub type Frame = Arc<str>;

/// Kind of a broadcast event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A chat line typed by a client
    Chat,
    /// A client was registered with the hub
    Join,
    /// A client was unregistered from the hub
    Leave,
}

/// An event before the hub has processed it.
///
/// Events carry no timestamp; the hub assigns one when it dequeues the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: MessageKind,
    pub username: String,
    pub content: String,
}

impl Event {
    pub fn chat(username: impl Into<String>, content: impl Into<String>) -> Self {
        Event {
            kind: MessageKind::Chat,
            username: username.into(),
            content: content.into(),
        }
    }

    pub fn join(username: impl Into<String>) -> Self {
        Event {
            kind: MessageKind::Join,
            username: username.into(),
            content: String::new(),
        }
    }

    pub fn leave(username: impl Into<String>) -> Self {
        Event {
            kind: MessageKind::Leave,
            username: username.into(),
            content: String::new(),
        }
    }

    /// Freezes the event into a wire message with the given timestamp.
    pub fn stamp(self, timestamp: String) -> Message {
        Message {
            kind: self.kind,
            username: self.username,
            content: self.content,
            timestamp,
        }
    }
}

/// Message struct that represents one frame sent to clients.
///
/// # examples
///
/// ```rust
/// use chathub::message::{Event, Message, MessageKind};
///
/// let message = Event::chat("alice", "hi").stamp("3:04PM".to_string());
/// let json = serde_json::to_string(&message).unwrap();
/// assert_eq!(
///     json,
///     r#"{"type":"chat","username":"alice","content":"hi","timestamp":"3:04PM"}"#
/// );
///
/// let decoded = Message::from_json(&json).unwrap();
/// assert_eq!(decoded.kind, MessageKind::Chat);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    #[serde(rename = "type", alias = "kind")]
    pub kind: MessageKind,
    /// Originating display name, empty for none.
    #[serde(default)]
    pub username: String,
    /// Empty for join and leave.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Message {
    pub fn from_json(text: &str) -> Result<Message, ChatError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Turns a message into the bytes written to every recipient.
pub trait Codec: Send + 'static {
    fn encode(&self, message: &Message) -> Result<Frame, ChatError>;
}

/// Default JSON codec, one object per text frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, message: &Message) -> Result<Frame, ChatError> {
        let json = serde_json::to_string(message)?;
        Ok(Frame::from(json))
    }
}

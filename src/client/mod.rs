//! This module defines the `Client` handle the hub keeps for each registered connection.

use crate::message::Frame;
use crate::utils::get_id;
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

/// Stable identity of one connection, used as the registry key.
///
/// Assigned once at creation and never reused; a reconnect gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub fn next() -> Self {
        ClientId(get_id())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// A client is one connected participant as seen by the hub.
///
/// It holds the only producer end of the client's outbound queue, so dropping
/// the `Client` is what closes the queue. The hub owns it while registered.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub username: String,
    sender: Sender<Frame>,
}

impl Client {
    /// Creates a client with a fresh id and a bounded outbound queue.
    ///
    /// The returned receiver is the consumer end for the outbound pump.
    pub fn new(username: impl Into<String>, capacity: usize) -> (Self, Receiver<Frame>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let client = Client {
            id: ClientId::next(),
            username: username.into(),
            sender,
        };
        (client, receiver)
    }

    /// Non-blocking enqueue onto the outbound queue.
    pub fn try_send(&self, frame: Frame) -> Result<(), TrySendError<Frame>> {
        self.sender.try_send(frame)
    }

    /// Closes the outbound queue. The outbound pump drains what is queued, then stops.
    pub fn close(self) {
        drop(self.sender);
    }
}

/// Lifecycle of a connection. States only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClientState {
    Connecting,
    Registered,
    Unregistering,
    Closed,
}

impl ClientState {
    /// Moves to `next` if it is later in the lifecycle; returns whether it moved.
    pub fn advance(&mut self, next: ClientState) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }

    pub fn is_closed(&self) -> bool {
        *self == ClientState::Closed
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Connecting => "CONNECTING",
            ClientState::Registered => "REGISTERED",
            ClientState::Unregistering => "UNREGISTERING",
            ClientState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

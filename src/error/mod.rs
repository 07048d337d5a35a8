//! Error taxonomy shared by the hub, the pumps and the transports.
//!
//! Only [`ChatError::Bind`] is fatal. Everything else is contained to a single
//! client or a single broadcast and turned into a lifecycle transition.
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Read or write failure, deadline expiry or abrupt close of one connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// An outbound event could not be serialized.
    #[error("failed to encode message: {0}")]
    Encoding(String),

    /// The request was rejected before any client was created.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// A submission was made after the hub stopped.
    #[error("hub is no longer running")]
    HubClosed,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ChatError {
    pub fn connection(err: impl std::fmt::Display) -> Self {
        ChatError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Encoding(err.to_string())
    }
}

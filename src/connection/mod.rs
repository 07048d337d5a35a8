//! The connection boundary: traits the pumps use to read and write frames.
//!
//! Transports split a connection into a [`StreamAdapter`] for the inbound pump
//! and a [`SinkAdapter`] for the outbound pump.

use crate::error::ChatError;
use crate::message::Frame;
use async_trait::async_trait;

/// A frame read from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A complete data frame.
    Text(String),
    /// Liveness acknowledgment.
    Pong,
    /// The peer closed the connection. `expected` is false for close
    /// reasons worth reporting.
    Close { expected: bool },
    /// Frames the pumps have no use for, such as peer-initiated probes.
    Other,
}

#[async_trait]
pub trait StreamAdapter: Send {
    /// Waits for the next frame. `Ok(None)` means the stream ended.
    async fn next(&mut self) -> Result<Option<InboundFrame>, ChatError>;
}

#[async_trait]
pub trait SinkAdapter: Send {
    async fn send_text(&mut self, frame: Frame) -> Result<(), ChatError>;

    /// Sends a liveness probe.
    async fn send_ping(&mut self) -> Result<(), ChatError>;

    /// Tells the peer the connection is closing.
    async fn send_close(&mut self) -> Result<(), ChatError>;
}

//! In-process transport over tokio mpsc channels.
//!
//! Runs the same pumps as a network connection, with channels standing in for the socket.
mod test;

use crate::config::ChatConfig;
use crate::connection::{InboundFrame, SinkAdapter, StreamAdapter};
use crate::error::ChatError;
use crate::hub::HubHandle;
use crate::message::Frame;
use crate::pump::{serve_connection, SessionSummary};
use async_trait::async_trait;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;

/// A frame written by the outbound pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(Frame),
    Ping,
    Close,
}

/// An implementation of [`SinkAdapter`] that writes frames to a `tokio::sync::mpsc::Sender`.
#[derive(Clone)]
pub struct ChannelSink {
    sender: Sender<OutboundFrame>,
}

impl ChannelSink {
    pub fn new(sender: Sender<OutboundFrame>) -> Self {
        ChannelSink { sender }
    }

    async fn write(&mut self, frame: OutboundFrame) -> Result<(), ChatError> {
        self.sender
            .send(frame)
            .await
            .map_err(|_| ChatError::Connection("peer receiver dropped".to_string()))
    }
}

#[async_trait]
impl SinkAdapter for ChannelSink {
    async fn send_text(&mut self, frame: Frame) -> Result<(), ChatError> {
        self.write(OutboundFrame::Text(frame)).await
    }

    async fn send_ping(&mut self) -> Result<(), ChatError> {
        self.write(OutboundFrame::Ping).await
    }

    async fn send_close(&mut self) -> Result<(), ChatError> {
        self.write(OutboundFrame::Close).await
    }
}

/// An implementation of [`StreamAdapter`] that reads frames from a `tokio::sync::mpsc::Receiver`.
pub struct ChannelStream {
    receiver: Receiver<InboundFrame>,
}

impl ChannelStream {
    pub fn new(receiver: Receiver<InboundFrame>) -> Self {
        ChannelStream { receiver }
    }
}

#[async_trait]
impl StreamAdapter for ChannelStream {
    async fn next(&mut self) -> Result<Option<InboundFrame>, ChatError> {
        Ok(self.receiver.recv().await)
    }
}

/// The peer's end of an in-process connection.
pub struct MpscConnection {
    /// Frames the peer sends. Dropping it ends the stream.
    pub inbound: Sender<InboundFrame>,
    /// Frames the server writes to the peer.
    pub outbound: Receiver<OutboundFrame>,
    /// Completes when both pumps have stopped.
    pub session: JoinHandle<SessionSummary>,
}

/// Connects in-process clients to a hub.
///
/// Each connection runs the same pumps a network client gets.
#[derive(Clone)]
pub struct MpscTransport {
    hub: HubHandle,
    config: ChatConfig,
}

impl MpscTransport {
    pub fn new(hub: HubHandle, config: ChatConfig) -> Self {
        MpscTransport { hub, config }
    }

    /// Opens a connection for `username`, buffering `buffer_size` frames each way.
    pub fn connect(&self, username: impl Into<String>, buffer_size: usize) -> MpscConnection {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer_size);
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer_size);

        let hub = self.hub.clone();
        let config = self.config.clone();
        let username = username.into();

        let session = tokio::spawn(async move {
            let stream = ChannelStream::new(inbound_rx);
            let sink = ChannelSink::new(outbound_tx);
            serve_connection(stream, sink, username, hub, &config).await
        });

        MpscConnection {
            inbound: inbound_tx,
            outbound: outbound_rx,
            session,
        }
    }
}

//! Per-connection pumps bridging one connection to the hub.
//!
//! The inbound pump reads frames and submits chat events; the outbound pump
//! drains the client's queue onto the connection and sends liveness probes.
//! The two only share the queue-closed signal and a connection-closed signal.

use crate::client::{Client, ClientId, ClientState};
use crate::config::ChatConfig;
use crate::connection::{InboundFrame, SinkAdapter, StreamAdapter};
use crate::error::ChatError;
use crate::hub::HubHandle;
use crate::message::{Event, Frame};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc::Receiver, oneshot};
use tokio::time::{interval_at, timeout, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Why the inbound pump stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundExit {
    /// The peer sent a close frame.
    PeerClosed,
    /// The stream ended without a close frame.
    StreamEnded,
    ReadFailed(String),
    /// No liveness acknowledgment arrived before the read deadline.
    DeadlineElapsed,
    /// The outbound pump stopped and took the connection down with it.
    ConnectionClosed,
    /// The hub stopped accepting submissions.
    HubClosed,
}

/// Why the outbound pump stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundExit {
    /// The hub closed the queue.
    QueueClosed,
    WriteFailed(String),
    /// A write did not finish within the write deadline.
    WriteTimedOut,
}

/// Reads frames until the connection fails, then unregisters the client.
///
/// The read deadline starts at `pong_wait` and is pushed back by every
/// liveness acknowledgment. `connection_closed` resolves when the outbound
/// pump has stopped; that also ends the read.
pub async fn read_pump<S>(
    client_id: ClientId,
    username: &str,
    stream: &mut S,
    hub: &HubHandle,
    pong_wait: Duration,
    mut connection_closed: oneshot::Receiver<()>,
) -> InboundExit
where
    S: StreamAdapter + ?Sized,
{
    let mut deadline = Instant::now() + pong_wait;

    let exit = loop {
        let read = tokio::select! {
            _ = &mut connection_closed => break InboundExit::ConnectionClosed,
            read = timeout_at(deadline, stream.next()) => read,
        };

        match read {
            Err(_) => break InboundExit::DeadlineElapsed,
            Ok(Err(e)) => break InboundExit::ReadFailed(e.to_string()),
            Ok(Ok(None)) => break InboundExit::StreamEnded,
            Ok(Ok(Some(InboundFrame::Close { expected }))) => {
                if !expected {
                    warn!(%client_id, %username, "connection closed unexpectedly");
                }
                break InboundExit::PeerClosed;
            }
            Ok(Ok(Some(InboundFrame::Pong))) => {
                trace!(%client_id, "pong received");
                deadline = Instant::now() + pong_wait;
            }
            Ok(Ok(Some(InboundFrame::Text(content)))) => {
                if hub.broadcast(Event::chat(username, content)).await.is_err() {
                    break InboundExit::HubClosed;
                }
            }
            Ok(Ok(Some(InboundFrame::Other))) => {}
        }
    };

    debug!(%client_id, ?exit, "inbound pump stopped");
    if let Err(e) = hub.unregister(client_id).await {
        debug!(%client_id, error = %e, "unregister not delivered");
    }
    exit
}

/// Writes queued frames and periodic probes until the queue closes or a write fails.
///
/// Every write is bounded by `write_wait`. When the hub closes the queue a
/// close indication is sent before stopping.
pub async fn write_pump<K>(
    sink: &mut K,
    mut queue: Receiver<Frame>,
    write_wait: Duration,
    ping_period: Duration,
) -> OutboundExit
where
    K: SinkAdapter + ?Sized,
{
    let mut ticker = interval_at(Instant::now() + ping_period, ping_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            item = queue.recv() => match item {
                Some(frame) => {
                    if let Err(exit) = bounded_write(write_wait, sink.send_text(frame)).await {
                        return exit;
                    }
                }
                None => {
                    if let Err(exit) = bounded_write(write_wait, sink.send_close()).await {
                        debug!(?exit, "close indication not delivered");
                    }
                    return OutboundExit::QueueClosed;
                }
            },
            _ = ticker.tick() => {
                if let Err(exit) = bounded_write(write_wait, sink.send_ping()).await {
                    return exit;
                }
                trace!("ping sent");
            }
        }
    }
}

async fn bounded_write<F>(write_wait: Duration, write: F) -> Result<(), OutboundExit>
where
    F: Future<Output = Result<(), ChatError>>,
{
    match timeout(write_wait, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(OutboundExit::WriteFailed(e.to_string())),
        Err(_) => Err(OutboundExit::WriteTimedOut),
    }
}

/// How a connection ended.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub client_id: ClientId,
    pub state: ClientState,
    /// `None` when the client never got registered.
    pub inbound: Option<InboundExit>,
    pub outbound: Option<OutboundExit>,
}

/// Drives one connection through its whole lifecycle.
///
/// Registers a new client with the hub, runs both pumps as separate tasks
/// and returns once both have stopped and the connection halves are dropped.
pub async fn serve_connection<S, K>(
    stream: S,
    sink: K,
    username: String,
    hub: HubHandle,
    config: &ChatConfig,
) -> SessionSummary
where
    S: StreamAdapter + 'static,
    K: SinkAdapter + 'static,
{
    let mut state = ClientState::Connecting;
    let (client, queue) = Client::new(username.clone(), config.send_queue_capacity);
    let client_id = client.id;

    if let Err(e) = hub.register(client).await {
        warn!(%client_id, %username, error = %e, "registration refused");
        state.advance(ClientState::Closed);
        return SessionSummary {
            client_id,
            state,
            inbound: None,
            outbound: None,
        };
    }
    state.advance(ClientState::Registered);
    info!(%client_id, %username, "client connected");

    let (closed_tx, closed_rx) = oneshot::channel::<()>();
    let write_wait = config.write_wait;
    let ping_period = config.ping_period;
    let pong_wait = config.pong_wait;

    let mut writer = tokio::spawn(async move {
        let mut sink = sink;
        let exit = write_pump(&mut sink, queue, write_wait, ping_period).await;
        drop(sink);
        drop(closed_tx);
        exit
    });

    let reader_username = username.clone();
    let reader_hub = hub.clone();
    let mut reader = tokio::spawn(async move {
        let mut stream = stream;
        read_pump(
            client_id,
            &reader_username,
            &mut stream,
            &reader_hub,
            pong_wait,
            closed_rx,
        )
        .await
    });

    let (inbound, outbound) = tokio::select! {
        inbound = &mut reader => {
            state.advance(ClientState::Unregistering);
            (inbound, writer.await)
        }
        outbound = &mut writer => {
            state.advance(ClientState::Unregistering);
            (reader.await, outbound)
        }
    };
    state.advance(ClientState::Closed);

    let inbound = inbound.unwrap_or_else(|e| InboundExit::ReadFailed(e.to_string()));
    let outbound = outbound.unwrap_or_else(|e| OutboundExit::WriteFailed(e.to_string()));
    info!(%client_id, %username, ?inbound, ?outbound, "client disconnected");

    SessionSummary {
        client_id,
        state,
        inbound: Some(inbound),
        outbound: Some(outbound),
    }
}

//! HTTP surface: the welcome page and the WebSocket endpoint, served with axum.

use crate::config::ChatConfig;
use crate::connection::{InboundFrame, SinkAdapter, StreamAdapter};
use crate::error::ChatError;
use crate::hub::HubHandle;
use crate::message::Frame;
use crate::pump::serve_connection;
use async_trait::async_trait;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

const INDEX_HTML: &str = include_str!("../../../static/index.html");

// Lets `Bytes` point into the shared frame
struct SharedFrame(Frame);

impl AsRef<[u8]> for SharedFrame {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Wraps an encoded frame as WebSocket text without copying it.
pub fn shared_text(frame: Frame) -> Result<Utf8Bytes, ChatError> {
    Utf8Bytes::try_from(Bytes::from_owner(SharedFrame(frame))).map_err(ChatError::connection)
}

pub struct AxumWSSink {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl SinkAdapter for AxumWSSink {
    async fn send_text(&mut self, frame: Frame) -> Result<(), ChatError> {
        let message = Message::Text(shared_text(frame)?);
        self.sink.send(message).await.map_err(ChatError::connection)
    }

    async fn send_ping(&mut self) -> Result<(), ChatError> {
        self.sink
            .send(Message::Ping(vec![].into()))
            .await
            .map_err(ChatError::connection)
    }

    async fn send_close(&mut self) -> Result<(), ChatError> {
        self.sink
            .send(Message::Close(None))
            .await
            .map_err(ChatError::connection)
    }
}

pub struct AxumWSStream {
    stream: SplitStream<WebSocket>,
}

#[async_trait]
impl StreamAdapter for AxumWSStream {
    async fn next(&mut self) -> Result<Option<InboundFrame>, ChatError> {
        let Some(message) = self.stream.next().await else {
            return Ok(None);
        };
        let frame = match message.map_err(ChatError::connection)? {
            Message::Text(text) => InboundFrame::Text(text.to_string()),
            Message::Binary(bytes) => InboundFrame::Text(String::from_utf8_lossy(&bytes).into_owned()),
            Message::Pong(_) => InboundFrame::Pong,
            // answered by axum itself
            Message::Ping(_) => InboundFrame::Other,
            Message::Close(frame) => InboundFrame::Close {
                expected: is_expected_close(frame.as_ref()),
            },
        };
        Ok(Some(frame))
    }
}

fn is_expected_close(frame: Option<&CloseFrame>) -> bool {
    match frame {
        None => true,
        Some(frame) => frame.code == close_code::NORMAL || frame.code == close_code::AWAY,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub username: Option<String>,
}

impl ConnectParams {
    /// The display name to register under. Absent and empty are both refused.
    pub fn username(self) -> Result<String, ChatError> {
        self.username
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ChatError::Protocol("username is required".to_string()))
    }
}

#[derive(Clone)]
struct ChatState {
    hub: HubHandle,
    config: Arc<ChatConfig>,
}

/// Serves the chat over HTTP and WebSocket.
pub struct ChatServer {
    state: ChatState,
}

impl ChatServer {
    pub fn new(hub: HubHandle, config: ChatConfig) -> Self {
        ChatServer {
            state: ChatState {
                hub,
                config: Arc::new(config),
            },
        }
    }

    /// Router with the welcome page on `/` and the chat endpoint on `/ws`.
    pub fn router(&self) -> Router {
        let router = Router::new().route("/", get(serve_home));
        self.attach_router("/ws", router)
    }

    /// Mounts the chat endpoint on `path` of an existing router.
    pub fn attach_router(&self, path: &str, router: Router) -> Router {
        router.merge(
            Router::new()
                .route(path, get(ws_handler))
                .with_state(self.state.clone()),
        )
    }

    /// Accepts connections until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), ChatError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "chat server listening");
        }
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ChatError::connection)
    }
}

/// Binds the listening socket. Failing here is the one fatal error.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ChatError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ChatError::Bind { addr, source })
}

async fn serve_home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn ws_handler(
    State(state): State<ChatState>,
    Query(params): Query<ConnectParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let username = match params.username() {
        Ok(username) => username,
        Err(e) => {
            debug!(error = %e, "connection rejected");
            return (StatusCode::BAD_REQUEST, "Username is required").into_response();
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!(%username, error = %rejection, "websocket upgrade failed");
            return rejection.into_response();
        }
    };

    let ChatState { hub, config } = state;
    ws.max_message_size(config.max_message_size)
        .on_upgrade(move |socket| async move {
            let (sink, stream) = socket.split();
            serve_connection(
                AxumWSStream { stream },
                AxumWSSink { sink },
                username,
                hub,
                &config,
            )
            .await;
        })
}

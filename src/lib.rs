//! # chathub
//!
//! A broadcast chat server. Every connected client gets a pair of pumps and a
//! bounded outbound queue; a single [`hub::Hub`] task owns the set of
//! connected clients and fans every chat line out to all of them.
//!
//! ```no_run
//! use chathub::config::ChatConfig;
//! use chathub::hub::Hub;
//! use chathub::transport::axum::{bind, ChatServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chathub::error::ChatError> {
//!     let config = ChatConfig::default();
//!     let (hub, handle) = Hub::new(config.hub_queue_capacity);
//!     hub.spawn();
//!
//!     let listener = bind("127.0.0.1:8080".parse().unwrap()).await?;
//!     ChatServer::new(handle, config)
//!         .serve(listener, std::future::pending())
//!         .await
//! }
//! ```
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod hub;
pub mod message;
pub mod pump;
pub mod transport;
pub mod utils;

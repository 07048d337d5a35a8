//! Transports that turn real connections into pump adapters.
pub mod axum;
pub mod mpsc;

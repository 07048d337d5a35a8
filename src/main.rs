use anyhow::Result;
use chathub::config::ChatConfig;
use chathub::hub::Hub;
use chathub::transport::axum::{bind, ChatServer};
use clap::Parser;
use std::net::SocketAddr;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Socket address to accept connections on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = ?err, "failed to install ctrl-c handler");
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ChatConfig::default();
    config.validate()?;

    let (hub, handle) = Hub::new(config.hub_queue_capacity);
    hub.spawn();

    let listener = bind(cli.listen).await?;
    ChatServer::new(handle, config)
        .serve(listener, shutdown_signal())
        .await?;

    Ok(())
}

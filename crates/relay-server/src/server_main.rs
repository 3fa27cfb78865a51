//! Chat relay server binary.

use clap::Parser;
use relay_server::{Server, ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "relay-server", about = "Multi-client JSON chat relay")]
struct Args {
    /// Optional TOML configuration file; flags below override it.
    #[arg(long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
    /// Interface to listen on.
    #[arg(long, env = "RELAY_ADDRESS")]
    address: Option<String>,
    /// Port to listen on.
    #[arg(long, env = "RELAY_PORT")]
    port: Option<u16>,
    /// Maximum simultaneous connections.
    #[arg(long)]
    max_connections: Option<usize>,
    /// Dispatch queue capacity.
    #[arg(long)]
    queue_capacity: Option<usize>,
    /// Per-connection read timeout in seconds.
    #[arg(long)]
    read_timeout_secs: Option<u64>,
    /// Maximum envelope size in bytes.
    #[arg(long)]
    max_payload_len: Option<usize>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(address) = self.address {
            config.listen_address = address;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(max_connections) = self.max_connections {
            config.max_connections = max_connections;
        }
        if let Some(queue_capacity) = self.queue_capacity {
            config.queue_capacity = queue_capacity;
        }
        if let Some(read_timeout_secs) = self.read_timeout_secs {
            config.read_timeout_secs = read_timeout_secs;
        }
        if let Some(max_payload_len) = self.max_payload_len {
            config.max_payload_len = max_payload_len;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("relay_server=info".parse()?),
        )
        .init();

    let config = Args::parse().into_config()?;
    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            // No drain, no graceful peer close: remaining connections are
            // dropped with the process.
            tracing::info!("interrupted, shutting down");
            Ok(())
        }
    }
}

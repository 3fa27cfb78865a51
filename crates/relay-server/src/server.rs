//! Listener and accept loop.

use crate::broadcaster::{self, DispatchEntry};
use crate::config::ServerConfig;
use crate::handler::Handler;
use crate::registry::Registry;
use relay_core::{Response, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};

/// The chat relay server: a bound listener plus its registry, dispatch
/// queue, and broadcaster task.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    registry: Registry,
    queue: mpsc::Sender<DispatchEntry>,
}

impl Server {
    /// Bind the configured address and start the broadcaster. Bind failure
    /// is the one fatal startup condition.
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let listener =
            TcpListener::bind((config.listen_address.as_str(), config.port)).await?;
        let registry = Registry::new();
        let (queue, queue_rx) = mpsc::channel(config.queue_capacity);
        tokio::spawn(broadcaster::run(queue_rx, registry.clone()));
        Ok(Self {
            listener,
            config,
            registry,
            queue,
        })
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        self.registry.len().await
    }

    /// Accept connections forever. Errors from individual connections never
    /// surface here; only the listener itself can fail.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!("listening on {}", self.local_addr()?);
        loop {
            let (stream, peer_addr) = self.listener.accept().await?;
            if self.registry.len().await >= self.config.max_connections {
                tracing::warn!(
                    "client {peer_addr}: refused, at capacity ({})",
                    self.config.max_connections
                );
                tokio::spawn(refuse(stream, peer_addr));
                continue;
            }
            self.admit(stream, peer_addr).await;
        }
    }

    async fn admit(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let (reader, writer) = stream.into_split();
        let writer = Arc::new(Mutex::new(writer));
        let id = self.registry.insert(peer_addr, writer.clone()).await;
        tracing::info!(
            "client {id} {peer_addr}: connected ({} total)",
            self.registry.len().await
        );
        let handler = Handler {
            id,
            peer_addr,
            reader,
            writer,
            queue: self.queue.clone(),
            read_timeout: self.config.read_timeout(),
            max_payload_len: self.config.max_payload_len,
        };
        tokio::spawn(handler.run());
    }
}

/// Tell an over-capacity peer why it is being turned away, then hang up.
/// Nothing is registered for it, so there is nothing to clean up.
async fn refuse(mut stream: TcpStream, peer_addr: SocketAddr) {
    match Response::new(StatusCode::ServerError).encode() {
        Ok(reply) => {
            if let Err(err) = stream.write_all(&reply).await {
                tracing::debug!("client {peer_addr}: refusal not delivered: {err}");
            }
        }
        Err(err) => tracing::error!("cannot encode refusal: {err}"),
    }
}

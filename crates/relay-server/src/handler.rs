//! Per-connection receive loop.

use crate::broadcaster::DispatchEntry;
use crate::chat;
use crate::registry::{ConnId, SharedWriter};
use relay_core::{ActionKind, Message};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// One handler per accepted connection. Reads one envelope per socket read,
/// replies on its own socket, and enqueues anything needing fan-out. Never
/// touches the registry: its termination is announced through the dispatch
/// queue as a `quit` entry, which the broadcaster turns into the delete.
pub(crate) struct Handler {
    pub(crate) id: ConnId,
    pub(crate) peer_addr: SocketAddr,
    pub(crate) reader: OwnedReadHalf,
    pub(crate) writer: SharedWriter,
    pub(crate) queue: mpsc::Sender<DispatchEntry>,
    pub(crate) read_timeout: Duration,
    pub(crate) max_payload_len: usize,
}

impl Handler {
    pub(crate) async fn run(mut self) {
        tracing::debug!("client {} {}: handler started", self.id, self.peer_addr);
        self.receive_loop().await;

        // Guaranteed on every exit path: announce termination so the
        // broadcaster retires this connection's registry entry.
        match Message::new(ActionKind::Quit).encode() {
            Ok(payload) => {
                let entry = DispatchEntry {
                    origin: self.id,
                    payload,
                };
                let _ = self.queue.send(entry).await;
            }
            Err(err) => tracing::error!("client {}: cannot encode quit entry: {err}", self.id),
        }
        tracing::debug!("client {} {}: handler finished", self.id, self.peer_addr);
    }

    async fn receive_loop(&mut self) {
        let mut buf = vec![0u8; self.max_payload_len];
        loop {
            let read = match timeout(self.read_timeout, self.reader.read(&mut buf)).await {
                Err(_) => {
                    tracing::info!("client {} {}: read timeout", self.id, self.peer_addr);
                    return;
                }
                Ok(Err(err)) => {
                    tracing::info!("client {} {}: connection lost: {err}", self.id, self.peer_addr);
                    return;
                }
                Ok(Ok(0)) => {
                    tracing::info!("client {} {}: closed by peer", self.id, self.peer_addr);
                    return;
                }
                Ok(Ok(n)) => n,
            };
            let payload = &buf[..read];
            tracing::debug!(
                "client {} {}: received {}",
                self.id,
                self.peer_addr,
                String::from_utf8_lossy(payload)
            );

            let verdict = chat::evaluate(payload);
            let reply = match verdict.response.encode() {
                Ok(reply) => reply,
                Err(err) => {
                    tracing::error!("client {}: cannot encode reply: {err}", self.id);
                    return;
                }
            };
            if let Err(err) = self.writer.lock().await.write_all(&reply).await {
                tracing::info!("client {} {}: reply failed: {err}", self.id, self.peer_addr);
                return;
            }

            if verdict.forward {
                let entry = DispatchEntry {
                    origin: self.id,
                    payload: payload.to_vec(),
                };
                // Blocks when the queue is full: backpressure against a
                // slow broadcaster rather than unbounded growth.
                if self.queue.send(entry).await.is_err() {
                    tracing::error!("client {}: dispatch queue is gone", self.id);
                    return;
                }
            }
            if verdict.disconnect {
                tracing::info!("client {} {}: quit requested", self.id, self.peer_addr);
                return;
            }
        }
    }
}

//! Dispatch queue consumer.

use crate::registry::{ConnId, Registry};
use relay_core::{ActionKind, Message};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// One queued unit of work: the raw payload as received, tagged with the
/// connection it came from. Consumed exactly once.
pub(crate) struct DispatchEntry {
    pub(crate) origin: ConnId,
    pub(crate) payload: Vec<u8>,
}

/// The single consumer of the dispatch queue. All fan-out sends and all
/// registry deletions happen here, which is what makes per-connection
/// handlers free of shared-state concerns.
pub(crate) async fn run(mut queue: mpsc::Receiver<DispatchEntry>, registry: Registry) {
    while let Some(entry) = queue.recv().await {
        let message = match Message::decode(&entry.payload) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!("client {}: dropping undecodable entry: {err}", entry.origin);
                continue;
            }
        };
        match message.action() {
            ActionKind::Message => fan_out(&registry, &entry).await,
            ActionKind::Quit => {
                match registry.remove(entry.origin).await {
                    Some(peer_addr) => {
                        tracing::info!("client {} {}: connection retired", entry.origin, peer_addr);
                    }
                    None => tracing::debug!("client {}: already retired", entry.origin),
                }
            }
            other => {
                tracing::warn!("client {}: dropping unsupported entry `{other}`", entry.origin);
            }
        }
    }
    tracing::debug!("dispatch queue closed, broadcaster stopping");
}

/// Deliver the raw payload to every connection except its origin. A failed
/// send is logged and skipped; the remaining recipients still get theirs.
async fn fan_out(registry: &Registry, entry: &DispatchEntry) {
    let peers = registry.peers(entry.origin).await;
    tracing::debug!(
        "client {}: forwarding to {} recipient(s)",
        entry.origin,
        peers.len()
    );
    for (id, writer) in peers {
        if let Err(err) = writer.lock().await.write_all(&entry.payload).await {
            tracing::warn!("client {id}: delivery failed, skipping: {err}");
        }
    }
}

//! Shared table of live connections.
//!
//! The acceptor is the sole inserter, the broadcaster the sole deleter.
//! Insert, delete, and iteration all go through one `RwLock`, so neither
//! side ever observes a half-updated table. Fan-out iterates over a
//! snapshot, so no registry lock is held while writing to sockets.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, RwLock};

/// Process-local handle identifying one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ConnId(u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound half of a connection, shared between its handler (replies) and
/// the broadcaster (fan-out). The per-socket mutex keeps writes whole.
pub(crate) type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

struct ConnectionRecord {
    peer_addr: SocketAddr,
    writer: SharedWriter,
}

/// The connection table. Cloning shares the underlying map.
#[derive(Clone)]
pub(crate) struct Registry {
    inner: Arc<RwLock<HashMap<ConnId, ConnectionRecord>>>,
    next_id: Arc<AtomicU64>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a freshly accepted connection and allocate its handle.
    pub(crate) async fn insert(&self, peer_addr: SocketAddr, writer: SharedWriter) -> ConnId {
        let id = ConnId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = ConnectionRecord { peer_addr, writer };
        self.inner.write().await.insert(id, record);
        id
    }

    /// Drop a connection's record. Releasing the last reference to its
    /// write half closes the socket if the handler is already gone.
    pub(crate) async fn remove(&self, id: ConnId) -> Option<SocketAddr> {
        self.inner.write().await.remove(&id).map(|r| r.peer_addr)
    }

    pub(crate) async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Snapshot every connection except `exclude`, for fan-out.
    pub(crate) async fn peers(&self, exclude: ConnId) -> Vec<(ConnId, SharedWriter)> {
        self.inner
            .read()
            .await
            .iter()
            .filter(|(id, _)| **id != exclude)
            .map(|(id, record)| (*id, record.writer.clone()))
            .collect()
    }
}

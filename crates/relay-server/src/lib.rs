//! Multi-client TCP chat relay.
//!
//! One acceptor task admits connections, one handler task per connection
//! reads and acknowledges envelopes, and a single broadcaster task consumes
//! the shared dispatch queue to fan messages out to every other peer and to
//! retire connections. The broadcaster is the only task that deletes from
//! the connection registry; the acceptor is the only one that inserts.

mod broadcaster;
mod chat;
mod config;
mod handler;
mod registry;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use server::Server;

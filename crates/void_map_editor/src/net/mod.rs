//! # Network Module
//!
//! Connection to the map editing room.
//!
//! ```text
//! +-----------+  JSON text frames  +-----------+
//! |  Client   |<------------------>|   Room    |
//! +-----------+                    +-----------+
//!       |
//!       v
//! RoomConnection ── incoming ──> SyncProtocol
//!       ^
//!       └────────── emit ─────── CommandExecutor
//! ```

pub mod connection;
pub mod transport;

pub use connection::{LoopbackServer, RoomConnection};
pub use transport::{
    ChannelTransport, Transport, TransportError, TransportResult, TransportStats,
    WebSocketTransport,
};

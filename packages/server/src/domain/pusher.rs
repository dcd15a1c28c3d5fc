//! MessagePusher trait: the connection-registry port.
//!
//! The WebSocket itself is created in the UI layer; the hub only sees the
//! sending half of each connection's channel, registered here per room. This
//! keeps "accepting a socket" and "fanning out messages" separate concerns.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, RoomId};

/// Sending half of one connection's outbound channel.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Registry of live connections, keyed room → connection.
///
/// Contract: `register_connection` appends to the room's set, safe under
/// concurrent joins; `unregister_connection` removes the connection and
/// reports how many remain so the caller can tear the room down at zero;
/// `broadcast` delivers to every currently-open connection of the room in
/// registry iteration order, skipping closed connections without failing
/// the batch.
#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register_connection(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    );

    /// Remove the connection from the room's set. When the set becomes empty
    /// the room entry itself is dropped. Returns the number of connections
    /// left in the room.
    async fn unregister_connection(&self, room_id: &RoomId, connection_id: &ConnectionId)
        -> usize;

    /// Fan out to every open connection of the room. A room id with no
    /// registered connections is a no-op, not an error.
    async fn broadcast(&self, room_id: &RoomId, content: &str);

    /// Number of connections currently registered for the room.
    async fn room_occupancy(&self, room_id: &RoomId) -> usize;
}

//! WebSocket-backed MessagePusher implementation.
//!
//! ## 責務
//!
//! - 接続中の WebSocket `UnboundedSender` をルーム単位で管理
//! - ルーム内のクライアントへのメッセージ送信（broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! ルームの接続リストが空になった時点でルームのエントリ自体を削除します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, RoomId};

/// Insertion-ordered connection set of one room.
///
/// ブロードキャストは登録順に配信されるため、`Vec` で順序を保持します。
#[derive(Default)]
struct RoomConnections {
    entries: Vec<(ConnectionId, PusherChannel)>,
}

impl RoomConnections {
    fn insert(&mut self, connection_id: ConnectionId, sender: PusherChannel) {
        self.entries.retain(|(id, _)| *id != connection_id);
        self.entries.push((connection_id, sender));
    }

    fn remove(&mut self, connection_id: &ConnectionId) {
        self.entries.retain(|(id, _)| id != connection_id);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender（ルーム単位）
    ///
    /// Key: RoomId
    /// Value: そのルームの接続リスト（登録順）
    rooms: Mutex<HashMap<RoomId, RoomConnections>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id, sender);
        tracing::debug!(
            "Connection '{}' registered to room '{}'",
            connection_id,
            room_id
        );
    }

    async fn unregister_connection(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> usize {
        let mut rooms = self.rooms.lock().await;
        let remaining = match rooms.get_mut(room_id) {
            Some(connections) => {
                connections.remove(connection_id);
                connections.len()
            }
            None => 0,
        };
        if remaining == 0 {
            rooms.remove(room_id);
            tracing::debug!("Room '{}' drained, registry entry dropped", room_id);
        }
        tracing::debug!(
            "Connection '{}' unregistered from room '{}' ({} left)",
            connection_id,
            room_id,
            remaining
        );
        remaining
    }

    async fn broadcast(&self, room_id: &RoomId, content: &str) {
        let rooms = self.rooms.lock().await;
        let Some(connections) = rooms.get(room_id) else {
            // 空のルームへのブロードキャストは no-op
            tracing::debug!("Broadcast to unknown room '{}' skipped", room_id);
            return;
        };

        for (connection_id, sender) in &connections.entries {
            // 閉じた接続はスキップし、残りへの配信は継続する
            if let Err(e) = sender.send(content.to_string()) {
                tracing::warn!(
                    "Failed to push message to connection '{}' in room '{}': {}",
                    connection_id,
                    room_id,
                    e
                );
            } else {
                tracing::debug!("Broadcasted message to connection '{}'", connection_id);
            }
        }
    }

    async fn room_occupancy(&self, room_id: &RoomId) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(RoomConnections::len).unwrap_or(0)
    }
}

//! Server state shared across handlers.

use std::sync::Arc;

use crate::hub::RoomHub;

/// Shared application state
pub struct AppState {
    /// RoomHub（ルーム調停サービス）
    pub hub: Arc<RoomHub>,
}

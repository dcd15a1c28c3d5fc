//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    domain::RoomStatus, infrastructure::dto::http::RoomOverviewDto, ui::state::AppState,
};
use atelier_shared::time::{get_unix_timestamp, timestamp_to_rfc3339};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "time": timestamp_to_rfc3339(get_unix_timestamp()),
    }))
}

/// Debug endpoint listing every room currently holding state.
pub async fn debug_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomOverviewDto>> {
    let overview = state.hub.room_overview().await;

    let rooms: Vec<RoomOverviewDto> = overview
        .into_iter()
        .map(|room| RoomOverviewDto {
            room_id: room.room_id.into_string(),
            status: match room.status {
                RoomStatus::Ready => "ready".to_string(),
                RoomStatus::Playing => "playing".to_string(),
            },
            connections: room.connections,
            participants: room.participants,
        })
        .collect();

    Json(rooms)
}

//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// One active room as reported by the debug endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOverviewDto {
    pub room_id: String,
    pub status: String,
    pub connections: usize,
    pub participants: usize,
}

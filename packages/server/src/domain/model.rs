//! Core entities and value objects of the room hub.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RoomSummary;

/// Round duration a room starts with until a `roundTime` envelope changes it.
pub const DEFAULT_ROUND_TIME_SECS: u32 = 100;

/// Identifier of a room, derived from the final segment of the WebSocket path.
///
/// Partitions every other piece of hub state: connections, participants,
/// room state and timers are all keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one open WebSocket connection, generated at upgrade time.
///
/// A connection belongs to exactly one room for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric user identity resolved by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nickname(String);

impl Nickname {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Game category of a room. The room directory is the source of truth for
/// the allowed values, so the hub carries it opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCategory(String);

impl GameCategory {
    pub fn new(category: impl Into<String>) -> Self {
        Self(category.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of a room as seen by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Ready,
    Playing,
}

/// Game-facing identity of one connection: created by a successful `join`
/// envelope, one per connection, keyed by connection for handler lookups and
/// by user id for score aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub nickname: Nickname,
    pub score: u32,
    /// Credential the participant joined with; needed for the directory
    /// leave call when the connection closes.
    #[serde(skip_serializing)]
    pub credential: String,
    pub user_id: UserId,
}

impl Participant {
    /// Create a fresh participant with the seed score of zero.
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        nickname: Nickname,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            connection_id,
            nickname,
            score: 0,
            credential: credential.into(),
            user_id,
        }
    }

    /// Identity record for directory calls made on behalf of this
    /// participant.
    pub fn identity(&self) -> super::UserIdentity {
        super::UserIdentity {
            user_idx: self.user_id.value(),
            user_nickname: self.nickname.as_str().to_string(),
        }
    }
}

/// Per-room mutable state: a cache of room-directory answers plus the
/// hub-local fields (round duration, current turn).
///
/// Seeded lazily from the directory on the first connection to a room and
/// dropped when the room drains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomState {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub round_time_secs: u32,
    pub room_now: u32,
    pub room_max: u32,
    pub max_round: u32,
    pub game_category: GameCategory,
    /// Status string as reported by the room directory.
    pub room_status: String,
    pub admin_user_id: UserId,
    pub now_round: u32,
    pub room_turn: u32,
}

impl RoomState {
    /// Seed room state from a directory answer.
    pub fn from_summary(room_id: RoomId, summary: &RoomSummary) -> Self {
        Self {
            room_id,
            status: RoomStatus::Ready,
            round_time_secs: DEFAULT_ROUND_TIME_SECS,
            room_now: summary.room_now,
            room_max: summary.room_max,
            max_round: summary.max_round,
            game_category: GameCategory::new(summary.game_category.clone()),
            room_status: summary.room_status.clone(),
            admin_user_id: UserId::new(summary.admin_user_idx),
            now_round: summary.now_round,
            room_turn: 0,
        }
    }

    /// Refresh the cached directory fields from a directory-confirmed answer,
    /// leaving the hub-local fields (round duration, turn, status) untouched.
    pub fn apply_summary(&mut self, summary: &RoomSummary) {
        self.room_now = summary.room_now;
        self.room_max = summary.room_max;
        self.max_round = summary.max_round;
        self.game_category = GameCategory::new(summary.game_category.clone());
        self.room_status = summary.room_status.clone();
        self.admin_user_id = UserId::new(summary.admin_user_idx);
        self.now_round = summary.now_round;
    }
}

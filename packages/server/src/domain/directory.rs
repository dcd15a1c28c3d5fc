//! Collaborator traits for the external services of record.
//!
//! The hub never owns durable room or game state: the room directory decides
//! who may join, how large a room is and who administers it; the game
//! directory owns round lifecycle and scoring; the identity service maps a
//! credential to a user. The hub consumes all three through these traits so
//! the dispatcher can be tested against mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{RoomId, UserId};

/// Failure reported by a collaborator service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The credential did not resolve to a user.
    #[error("unauthorized")]
    Unauthorized,
    /// The directory rejected the request as a business failure
    /// (e.g. room full, capacity change refused). Not a hub fault.
    #[error("{0}")]
    Rejected(String),
    /// The directory could not be reached or answered malformed data.
    #[error("directory unavailable: {0}")]
    Transport(String),
}

/// Identity resolved from a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_idx: u64,
    pub user_nickname: String,
}

/// Durable room record as answered by the room directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_idx: String,
    pub room_now: u32,
    pub room_max: u32,
    pub max_round: u32,
    pub game_category: String,
    pub room_status: String,
    pub admin_user_idx: u64,
    pub now_round: u32,
}

/// One occupant of a room as listed by the room directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub user_idx: u64,
    pub user_nickname: String,
    pub user_score: u32,
}

/// Parameters for starting a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    pub room_idx: String,
    pub game_category: String,
    pub max_round: u32,
}

/// Game lifecycle answer from the game directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub room_idx: String,
    pub game_category: String,
    pub max_round: u32,
    pub now_round: u32,
}

/// Per-user score reported at round end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScore {
    pub user_idx: u64,
    pub user_score: u32,
}

/// Round-close answer from the game directory, including every occupant's
/// updated score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub room_idx: String,
    pub now_round: u32,
    pub user_list: Vec<UserScore>,
}

/// Maps a credential to a user identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn resolve(&self, credential: &str) -> Result<UserIdentity, DirectoryError>;
}

/// Service of record for durable room state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn get_room(&self, room_id: &RoomId) -> Result<RoomSummary, DirectoryError>;

    async fn join(
        &self,
        user: &UserIdentity,
        room_id: &RoomId,
    ) -> Result<RoomSummary, DirectoryError>;

    async fn change_capacity(
        &self,
        user: &UserIdentity,
        room_id: &RoomId,
        new_max: u32,
    ) -> Result<RoomSummary, DirectoryError>;

    async fn change_admin(
        &self,
        user: &UserIdentity,
        room_id: &RoomId,
        new_admin: UserId,
    ) -> Result<RoomSummary, DirectoryError>;

    async fn change_game_category(
        &self,
        room_id: &RoomId,
        category: &str,
    ) -> Result<(), DirectoryError>;

    async fn leave(&self, user: &UserIdentity) -> Result<RoomSummary, DirectoryError>;

    async fn list_participants(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<ParticipantRecord>, DirectoryError>;
}

/// Service of record for game rules: round lifecycle and scoring.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameDirectory: Send + Sync {
    async fn start_game(
        &self,
        user: &UserIdentity,
        request: GameRequest,
    ) -> Result<GameSummary, DirectoryError>;

    async fn next_round(&self, room_id: &RoomId) -> Result<GameSummary, DirectoryError>;

    async fn end_round(
        &self,
        room_id: &RoomId,
        winner: UserId,
    ) -> Result<RoundSummary, DirectoryError>;
}

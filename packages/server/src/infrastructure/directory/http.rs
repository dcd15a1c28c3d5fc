//! HTTP clients for the identity, room and game directory services.
//!
//! Every directory answer is a JSON envelope carrying a `status` field.
//! `status: "fail"` is a business refusal and maps to
//! [`DirectoryError::Rejected`]; HTTP 401 maps to `Unauthorized`; anything
//! unreachable or malformed maps to `Transport`.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{
    DirectoryError, GameDirectory, GameRequest, GameSummary, IdentityService, ParticipantRecord,
    RoomDirectory, RoomId, RoomSummary, RoundSummary, UserId, UserIdentity,
};

/// Directory answer whose payload fields sit at the top level next to
/// `status`.
#[derive(Debug, Deserialize)]
struct DirectoryReply<T> {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    body: Option<T>,
}

impl<T> DirectoryReply<T> {
    fn into_result(self) -> Result<T, DirectoryError> {
        if self.status == "fail" {
            return Err(DirectoryError::Rejected(self.message.unwrap_or_default()));
        }
        self.body
            .ok_or_else(|| DirectoryError::Transport("reply body missing".to_string()))
    }
}

/// Directory answer for list endpoints, where the payload is a `userList`
/// array rather than flattened fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantListReply {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user_list: Option<Vec<ParticipantRecord>>,
}

/// Directory answer for endpoints that only acknowledge.
#[derive(Debug, Deserialize)]
struct AckReply {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

fn transport(e: reqwest::Error) -> DirectoryError {
    DirectoryError::Transport(e.to_string())
}

async fn read_reply<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DirectoryError> {
    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(DirectoryError::Unauthorized);
    }
    let reply: DirectoryReply<T> = response.json().await.map_err(transport)?;
    reply.into_result()
}

async fn read_ack(response: reqwest::Response) -> Result<(), DirectoryError> {
    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(DirectoryError::Unauthorized);
    }
    let reply: AckReply = response.json().await.map_err(transport)?;
    if reply.status == "fail" {
        return Err(DirectoryError::Rejected(reply.message.unwrap_or_default()));
    }
    Ok(())
}

/// Identity service client: maps a bearer credential to a user.
pub struct HttpIdentityService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityService {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn resolve(&self, credential: &str) -> Result<UserIdentity, DirectoryError> {
        let response = self
            .client
            .get(format!("{}/api/users/me", self.base_url))
            .bearer_auth(credential)
            .send()
            .await
            .map_err(transport)?;
        read_reply(response).await
    }
}

/// Room directory client: the service of record for durable room state.
pub struct HttpRoomDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRoomDirectory {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn room_url(&self, room_id: &RoomId, suffix: &str) -> String {
        format!("{}/api/rooms/{}{}", self.base_url, room_id, suffix)
    }
}

#[async_trait]
impl RoomDirectory for HttpRoomDirectory {
    async fn get_room(&self, room_id: &RoomId) -> Result<RoomSummary, DirectoryError> {
        let response = self
            .client
            .get(self.room_url(room_id, ""))
            .send()
            .await
            .map_err(transport)?;
        read_reply(response).await
    }

    async fn join(
        &self,
        user: &UserIdentity,
        room_id: &RoomId,
    ) -> Result<RoomSummary, DirectoryError> {
        let response = self
            .client
            .post(self.room_url(room_id, "/join"))
            .json(user)
            .send()
            .await
            .map_err(transport)?;
        read_reply(response).await
    }

    async fn change_capacity(
        &self,
        user: &UserIdentity,
        room_id: &RoomId,
        new_max: u32,
    ) -> Result<RoomSummary, DirectoryError> {
        let response = self
            .client
            .post(self.room_url(room_id, "/capacity"))
            .json(&serde_json::json!({
                "user": user,
                "changedMax": new_max,
            }))
            .send()
            .await
            .map_err(transport)?;
        read_reply(response).await
    }

    async fn change_admin(
        &self,
        user: &UserIdentity,
        room_id: &RoomId,
        new_admin: UserId,
    ) -> Result<RoomSummary, DirectoryError> {
        let response = self
            .client
            .post(self.room_url(room_id, "/admin"))
            .json(&serde_json::json!({
                "user": user,
                "newAdminIdx": new_admin.value(),
            }))
            .send()
            .await
            .map_err(transport)?;
        read_reply(response).await
    }

    async fn change_game_category(
        &self,
        room_id: &RoomId,
        category: &str,
    ) -> Result<(), DirectoryError> {
        let response = self
            .client
            .post(self.room_url(room_id, "/category"))
            .json(&serde_json::json!({ "gameCategory": category }))
            .send()
            .await
            .map_err(transport)?;
        read_ack(response).await
    }

    async fn leave(&self, user: &UserIdentity) -> Result<RoomSummary, DirectoryError> {
        let response = self
            .client
            .post(format!("{}/api/rooms/leave", self.base_url))
            .json(user)
            .send()
            .await
            .map_err(transport)?;
        read_reply(response).await
    }

    async fn list_participants(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<ParticipantRecord>, DirectoryError> {
        let response = self
            .client
            .get(self.room_url(room_id, "/participants"))
            .send()
            .await
            .map_err(transport)?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DirectoryError::Unauthorized);
        }
        let reply: ParticipantListReply = response.json().await.map_err(transport)?;
        if reply.status == "fail" {
            return Err(DirectoryError::Rejected(reply.message.unwrap_or_default()));
        }
        reply
            .user_list
            .ok_or_else(|| DirectoryError::Transport("userList missing".to_string()))
    }
}

/// Game directory client: round lifecycle and scoring.
pub struct HttpGameDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGameDirectory {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl GameDirectory for HttpGameDirectory {
    async fn start_game(
        &self,
        user: &UserIdentity,
        request: GameRequest,
    ) -> Result<GameSummary, DirectoryError> {
        let response = self
            .client
            .post(format!("{}/api/games", self.base_url))
            .json(&serde_json::json!({
                "user": user,
                "game": request,
            }))
            .send()
            .await
            .map_err(transport)?;
        read_reply(response).await
    }

    async fn next_round(&self, room_id: &RoomId) -> Result<GameSummary, DirectoryError> {
        let response = self
            .client
            .post(format!(
                "{}/api/games/{}/rounds/next",
                self.base_url, room_id
            ))
            .send()
            .await
            .map_err(transport)?;
        read_reply(response).await
    }

    async fn end_round(
        &self,
        room_id: &RoomId,
        winner: UserId,
    ) -> Result<RoundSummary, DirectoryError> {
        let response = self
            .client
            .post(format!("{}/api/games/{}/rounds/end", self.base_url, room_id))
            .json(&serde_json::json!({ "winnerIdx": winner.value() }))
            .send()
            .await
            .map_err(transport)?;
        read_reply(response).await
    }
}

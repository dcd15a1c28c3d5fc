//! The RoomHub service: owns the connection registry, participant directory,
//! room state store and round timers, and exposes one method per protocol
//! operation for the dispatcher.
//!
//! All four registries live behind synchronized accessors on this object;
//! there is no global mutable state. Locking is per room, so traffic in one
//! room never blocks another.

mod participants;
mod room_state;
mod timer;

pub use participants::ParticipantDirectory;
pub use room_state::RoomStateStore;
pub use timer::RoundTimers;

use std::sync::Arc;

use crate::domain::{
    ConnectionId, GameCategory, GameDirectory, GameRequest, GameSummary, HubError,
    IdentityService, MessagePusher, Nickname, Participant, ParticipantRecord, PusherChannel,
    RoomDirectory, RoomId, RoomStatus, RoomSummary, RoundSummary, UserId,
};

/// Successful join outcome: the directory's answer plus the room's current
/// occupant listing, both broadcast to the whole room.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub room: RoomSummary,
    pub user_list: Vec<ParticipantRecord>,
}

/// Snapshot of one room for the debug endpoint.
#[derive(Debug, Clone)]
pub struct RoomOverview {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub connections: usize,
    pub participants: usize,
}

/// The room-coordination hub.
pub struct RoomHub {
    pusher: Arc<dyn MessagePusher>,
    identity: Arc<dyn IdentityService>,
    rooms: Arc<dyn RoomDirectory>,
    games: Arc<dyn GameDirectory>,
    room_states: RoomStateStore,
    participants: ParticipantDirectory,
    timers: RoundTimers,
}

impl RoomHub {
    pub fn new(
        pusher: Arc<dyn MessagePusher>,
        identity: Arc<dyn IdentityService>,
        rooms: Arc<dyn RoomDirectory>,
        games: Arc<dyn GameDirectory>,
    ) -> Self {
        let timers = RoundTimers::new(pusher.clone());
        Self {
            pusher,
            identity,
            rooms,
            games,
            room_states: RoomStateStore::new(),
            participants: ParticipantDirectory::new(),
            timers,
        }
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Register an opened connection and lazily initialize the room's state.
    ///
    /// The first connection to a room triggers one directory fetch; later
    /// connections reuse the seeded state. If the directory cannot answer,
    /// the connection is unregistered again and the error returned so the
    /// UI layer can drop the socket.
    pub async fn connect(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<(), HubError> {
        self.pusher
            .register_connection(room_id.clone(), connection_id, sender)
            .await;
        if let Err(e) = self
            .room_states
            .ensure_initialized(&room_id, self.rooms.as_ref())
            .await
        {
            self.pusher
                .unregister_connection(&room_id, &connection_id)
                .await;
            return Err(e);
        }
        tracing::info!(
            "Connection '{}' joined room '{}'",
            connection_id,
            room_id
        );
        Ok(())
    }

    /// Remove a closed connection. Returns the nickname of the departed
    /// participant if the connection had joined, so the caller can broadcast
    /// a departure notice to the remaining occupants.
    ///
    /// The registry entry is removed before anything else, so no broadcast
    /// issued after this call can reach the closed socket. When the room
    /// drains, its state, participants and any live countdown are torn down.
    pub async fn disconnect(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<Nickname> {
        let remaining = self
            .pusher
            .unregister_connection(room_id, connection_id)
            .await;

        let participant = self.participants.remove(room_id, connection_id).await;
        if let Some(participant) = &participant {
            let user = participant.identity();
            if let Err(e) = self.rooms.leave(&user).await {
                tracing::warn!(
                    "Directory leave for user '{}' failed: {}",
                    participant.user_id,
                    e
                );
            }
        }

        if remaining == 0 {
            self.teardown_room(room_id).await;
        }

        tracing::info!(
            "Connection '{}' left room '{}' ({} remaining)",
            connection_id,
            room_id,
            remaining
        );
        participant.map(|p| p.nickname)
    }

    /// Drop every piece of state a drained room holds.
    async fn teardown_room(&self, room_id: &RoomId) {
        self.timers.cancel(room_id).await;
        self.room_states.remove(room_id).await;
        self.participants.remove_room(room_id).await;
        tracing::info!("Room '{}' torn down", room_id);
    }

    /// Fan a payload out to every open connection of the room.
    pub async fn broadcast(&self, room_id: &RoomId, payload: &str) {
        self.pusher.broadcast(room_id, payload).await;
    }

    // ------------------------------------------------------------------
    // Dispatcher operations
    // ------------------------------------------------------------------

    /// `join`: resolve the credential, create/replace the participant for
    /// this connection with a seed score of zero, and ask the room directory
    /// to admit the user.
    pub async fn join(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        authorization: &str,
    ) -> Result<JoinOutcome, HubError> {
        let user = self
            .identity
            .resolve(authorization)
            .await
            .map_err(|_| HubError::Unauthorized)?;

        let participant = Participant::new(
            connection_id,
            UserId::new(user.user_idx),
            Nickname::new(user.user_nickname.clone()),
            authorization,
        );
        self.participants.upsert(room_id, participant).await;

        let room = self.rooms.join(&user, room_id).await?;
        let user_list = self.rooms.list_participants(room_id).await?;
        self.room_states.apply_summary(room_id, &room).await;

        tracing::info!(
            "User '{}' ({}) joined room '{}'",
            user.user_nickname,
            user.user_idx,
            room_id
        );
        Ok(JoinOutcome { room, user_list })
    }

    /// `changeCapacity`: the directory enforces that the requester is the
    /// room admin; on success the cached summary fields are refreshed.
    pub async fn change_capacity(
        &self,
        room_id: &RoomId,
        authorization: &str,
        new_max: u32,
    ) -> Result<RoomSummary, HubError> {
        let user = self
            .identity
            .resolve(authorization)
            .await
            .map_err(|_| HubError::Unauthorized)?;
        let summary = self.rooms.change_capacity(&user, room_id, new_max).await?;
        self.room_states.apply_summary(room_id, &summary).await;
        Ok(summary)
    }

    /// `changeAdmin`: the local cache is updated first (the directory's
    /// confirmed answer refreshes it again on success).
    pub async fn change_admin(
        &self,
        room_id: &RoomId,
        authorization: &str,
        new_admin: UserId,
    ) -> Result<RoomSummary, HubError> {
        let user = self
            .identity
            .resolve(authorization)
            .await
            .map_err(|_| HubError::Unauthorized)?;
        self.room_states
            .update(room_id, |state| state.admin_user_id = new_admin)
            .await?;
        let summary = self.rooms.change_admin(&user, room_id, new_admin).await?;
        self.room_states.apply_summary(room_id, &summary).await;
        Ok(summary)
    }

    /// `changeGameType`: update the cached category and notify the directory
    /// fire-and-forget.
    pub async fn change_game_category(
        &self,
        room_id: &RoomId,
        category: &str,
    ) -> Result<(), HubError> {
        self.room_states
            .update(room_id, |state| {
                state.game_category = GameCategory::new(category)
            })
            .await?;

        let rooms = self.rooms.clone();
        let task_room_id = room_id.clone();
        let task_category = category.to_string();
        tokio::spawn(async move {
            if let Err(e) = rooms
                .change_game_category(&task_room_id, &task_category)
                .await
            {
                tracing::warn!(
                    "Directory game-category update for room '{}' failed: {}",
                    task_room_id,
                    e
                );
            }
        });
        Ok(())
    }

    /// `playerCnt`: read-through to the directory's current occupancy.
    pub async fn player_count(&self, room_id: &RoomId) -> Result<u32, HubError> {
        let summary = self.rooms.get_room(room_id).await?;
        Ok(summary.room_now)
    }

    /// `gameMode`: read-through to the directory's game category.
    pub async fn game_mode(&self, room_id: &RoomId) -> Result<String, HubError> {
        let summary = self.rooms.get_room(room_id).await?;
        Ok(summary.game_category)
    }

    /// `gameTime`: the locally configured round duration.
    pub async fn game_time(&self, room_id: &RoomId) -> Result<u32, HubError> {
        let state = self.room_states.get(room_id).await?;
        Ok(state.round_time_secs)
    }

    /// `gameTurn`: fetch the directory's current round and cache it as the
    /// room's turn counter.
    pub async fn game_turn(&self, room_id: &RoomId) -> Result<u32, HubError> {
        let summary = self.rooms.get_room(room_id).await?;
        self.room_states
            .update(room_id, |state| state.room_turn = summary.now_round)
            .await?;
        Ok(summary.now_round)
    }

    /// `roundTime`: set the round duration used by the next countdown.
    pub async fn set_round_time(&self, room_id: &RoomId, secs: u32) -> Result<(), HubError> {
        self.room_states
            .update(room_id, |state| state.round_time_secs = secs)
            .await
    }

    /// `gameStart`: mark the room playing and ask the game directory to
    /// start a game with the cached category and round count.
    pub async fn game_start(
        &self,
        room_id: &RoomId,
        authorization: &str,
    ) -> Result<GameSummary, HubError> {
        let user = self
            .identity
            .resolve(authorization)
            .await
            .map_err(|_| HubError::Unauthorized)?;
        let state = self.room_states.get(room_id).await?;
        self.room_states
            .update(room_id, |state| state.status = RoomStatus::Playing)
            .await?;
        let request = GameRequest {
            room_idx: room_id.as_str().to_string(),
            game_category: state.game_category.as_str().to_string(),
            max_round: state.max_round,
        };
        let summary = self.games.start_game(&user, request).await?;
        Ok(summary)
    }

    /// `timeStart`: start the room's countdown with the configured duration,
    /// cancelling any countdown already running there. Returns the duration
    /// the countdown was started with.
    pub async fn time_start(&self, room_id: &RoomId) -> Result<u32, HubError> {
        let state = self.room_states.get(room_id).await?;
        self.timers
            .start(room_id.clone(), state.round_time_secs)
            .await;
        Ok(state.round_time_secs)
    }

    /// `nextRound`: advance the game directory's round for this room.
    pub async fn next_round(&self, room_id: &RoomId) -> Result<GameSummary, HubError> {
        let summary = self.games.next_round(room_id).await?;
        Ok(summary)
    }

    /// `roundOver`: close the round with the supplied winner and copy the
    /// reported per-user scores into the matching participants and the score
    /// index.
    pub async fn round_over(
        &self,
        room_id: &RoomId,
        winner: UserId,
    ) -> Result<RoundSummary, HubError> {
        let summary = self.games.end_round(room_id, winner).await?;
        for entry in &summary.user_list {
            self.participants
                .set_score(room_id, UserId::new(entry.user_idx), entry.user_score)
                .await;
        }
        Ok(summary)
    }

    /// `gameOver`: mark the room ready again and return the final ranking,
    /// descending by score with ties broken by ascending user id.
    pub async fn game_over(&self, room_id: &RoomId) -> Result<Vec<(Nickname, u32)>, HubError> {
        self.room_states
            .update(room_id, |state| state.status = RoomStatus::Ready)
            .await?;
        Ok(self.participants.ranking(room_id).await)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Participant for a connection, for handlers that require a joined
    /// connection.
    pub async fn participant(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<Participant, HubError> {
        self.participants.get(room_id, connection_id).await
    }

    /// Snapshot of every room currently holding state, for the debug
    /// endpoint.
    pub async fn room_overview(&self) -> Vec<RoomOverview> {
        let mut overview = Vec::new();
        for room_id in self.room_states.room_ids().await {
            let Ok(state) = self.room_states.get(&room_id).await else {
                continue;
            };
            overview.push(RoomOverview {
                status: state.status,
                connections: self.pusher.room_occupancy(&room_id).await,
                participants: self.participants.count(&room_id).await,
                room_id,
            });
        }
        overview
    }
}

#[cfg(test)]
mod tests;

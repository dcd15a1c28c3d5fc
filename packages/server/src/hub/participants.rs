//! Participant Directory: the game-facing identity of each connection plus
//! the room-scoped score index used for the final ranking.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, HubError, Nickname, Participant, RoomId, UserId};

/// One room's roster: participants keyed by connection for handler lookups,
/// scores keyed by user id for aggregation.
#[derive(Default)]
struct RoomRoster {
    participants: HashMap<ConnectionId, Participant>,
    /// userId → (nickname, latest score). BTreeMap keeps user-id order so
    /// equal scores rank deterministically; carrying the nickname here lets
    /// the ranking include players whose connection already closed.
    scores: BTreeMap<UserId, (Nickname, u32)>,
}

/// Per-room participant registry.
pub struct ParticipantDirectory {
    rooms: Mutex<HashMap<RoomId, RoomRoster>>,
}

impl ParticipantDirectory {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Create or replace the participant for a connection and seed its score
    /// index entry with zero.
    pub async fn upsert(&self, room_id: &RoomId, participant: Participant) {
        let mut rooms = self.rooms.lock().await;
        let roster = rooms.entry(room_id.clone()).or_default();
        roster
            .scores
            .entry(participant.user_id)
            .and_modify(|entry| entry.0 = participant.nickname.clone())
            .or_insert_with(|| (participant.nickname.clone(), 0));
        roster
            .participants
            .insert(participant.connection_id, participant);
    }

    /// Participant for a connection, or `NotJoined` if the connection never
    /// sent a successful `join`.
    pub async fn get(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<Participant, HubError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .and_then(|roster| roster.participants.get(connection_id))
            .cloned()
            .ok_or(HubError::NotJoined)
    }

    /// Remove the participant of a closing connection. The score index entry
    /// is kept so a departed player still appears in the final ranking data
    /// until the room tears down.
    pub async fn remove(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<Participant> {
        let mut rooms = self.rooms.lock().await;
        rooms
            .get_mut(room_id)
            .and_then(|roster| roster.participants.remove(connection_id))
    }

    /// Record a round-end score for a user: updates the score index and the
    /// matching participant entry, if that user is still connected.
    pub async fn set_score(&self, room_id: &RoomId, user_id: UserId, score: u32) {
        let mut rooms = self.rooms.lock().await;
        let Some(roster) = rooms.get_mut(room_id) else {
            return;
        };
        let mut nickname = None;
        for participant in roster.participants.values_mut() {
            if participant.user_id == user_id {
                participant.score = score;
                nickname = Some(participant.nickname.clone());
            }
        }
        match roster.scores.get_mut(&user_id) {
            Some(entry) => entry.1 = score,
            None => match nickname {
                Some(name) => {
                    roster.scores.insert(user_id, (name, score));
                }
                None => {
                    tracing::warn!(
                        "Score for unknown user '{}' in room '{}' dropped",
                        user_id,
                        room_id
                    );
                }
            },
        }
    }

    /// Number of participants currently joined in the room.
    pub async fn count(&self, room_id: &RoomId) -> usize {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(|roster| roster.participants.len())
            .unwrap_or(0)
    }

    /// Final ranking over the score index: (nickname, score) descending by
    /// score, ties broken by ascending user id. One sort over the player
    /// count.
    pub async fn ranking(&self, room_id: &RoomId) -> Vec<(Nickname, u32)> {
        let rooms = self.rooms.lock().await;
        let Some(roster) = rooms.get(room_id) else {
            return Vec::new();
        };

        // BTreeMap iteration is ascending by user id; the stable sort below
        // therefore breaks score ties by user id.
        let mut ranked: Vec<(Nickname, u32)> = roster.scores.values().cloned().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Drop every participant and score of a drained room.
    pub async fn remove_room(&self, room_id: &RoomId) {
        let mut rooms = self.rooms.lock().await;
        if rooms.remove(room_id).is_some() {
            tracing::debug!("Participants of room '{}' dropped", room_id);
        }
    }
}

impl Default for ParticipantDirectory {
    fn default() -> Self {
        Self::new()
    }
}

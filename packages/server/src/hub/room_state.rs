//! Room State Store: per-room mutable state behind per-room locks.
//!
//! The first connection to a room triggers exactly one directory fetch; the
//! seeded state is then mutated by dispatcher handlers and dropped when the
//! room drains. Locking is per room, so handlers for different rooms never
//! block each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{HubError, RoomDirectory, RoomId, RoomState, RoomSummary};

type RoomSlot = Arc<Mutex<Option<RoomState>>>;

/// Per-room state cache, keyed by room id.
pub struct RoomStateStore {
    slots: Mutex<HashMap<RoomId, RoomSlot>>,
}

impl RoomStateStore {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create the slot for a room. The outer lock is held only for
    /// the map access, never across a directory call.
    async fn slot(&self, room_id: &RoomId) -> RoomSlot {
        let mut slots = self.slots.lock().await;
        slots.entry(room_id.clone()).or_default().clone()
    }

    /// Seed room state from the room directory if this room has not been
    /// initialized yet. Idempotent while the room stays occupied: concurrent
    /// and repeated calls perform at most one directory fetch.
    pub async fn ensure_initialized(
        &self,
        room_id: &RoomId,
        rooms: &dyn RoomDirectory,
    ) -> Result<(), HubError> {
        let slot = self.slot(room_id).await;
        let mut state = slot.lock().await;
        if state.is_some() {
            return Ok(());
        }
        let summary = rooms.get_room(room_id).await?;
        tracing::info!("Room '{}' state seeded from directory", room_id);
        *state = Some(RoomState::from_summary(room_id.clone(), &summary));
        Ok(())
    }

    /// Snapshot of the room's state.
    pub async fn get(&self, room_id: &RoomId) -> Result<RoomState, HubError> {
        let slot = self.slot(room_id).await;
        let state = slot.lock().await;
        state.clone().ok_or(HubError::RoomNotInitialized)
    }

    /// Mutate the room's state under its lock.
    pub async fn update<F>(&self, room_id: &RoomId, mutate: F) -> Result<(), HubError>
    where
        F: FnOnce(&mut RoomState),
    {
        let slot = self.slot(room_id).await;
        let mut state = slot.lock().await;
        match state.as_mut() {
            Some(state) => {
                mutate(state);
                Ok(())
            }
            None => Err(HubError::RoomNotInitialized),
        }
    }

    /// Refresh the cached directory fields from a directory-confirmed
    /// mutation (capacity or admin change success, join response).
    pub async fn apply_summary(&self, room_id: &RoomId, summary: &RoomSummary) {
        let slot = self.slot(room_id).await;
        let mut state = slot.lock().await;
        if let Some(state) = state.as_mut() {
            state.apply_summary(summary);
        }
    }

    /// Drop the room's state on teardown.
    pub async fn remove(&self, room_id: &RoomId) {
        let mut slots = self.slots.lock().await;
        if slots.remove(room_id).is_some() {
            tracing::debug!("Room '{}' state dropped", room_id);
        }
    }

    /// Room ids currently holding state, for the debug endpoint.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        let slots = self.slots.lock().await;
        slots.keys().cloned().collect()
    }
}

impl Default for RoomStateStore {
    fn default() -> Self {
        Self::new()
    }
}

//! Round Timer: per-room countdown tasks.
//!
//! Each room has at most one live countdown. Starting a new one cancels the
//! previous task first, and room teardown cancels whatever is left, so two
//! timers can never double-broadcast into the same room.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::domain::{MessagePusher, RoomId};

/// Running countdown tasks, keyed by room id.
pub struct RoundTimers {
    pusher: Arc<dyn MessagePusher>,
    running: Mutex<HashMap<RoomId, JoinHandle<()>>>,
}

impl RoundTimers {
    pub fn new(pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            pusher,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Start a countdown of `secs` seconds for the room, cancelling any
    /// prior countdown still running there.
    ///
    /// The task holds a private copy of the duration: it waits one second,
    /// broadcasts the remaining count, decrements, and stops after
    /// broadcasting 1. No tick is sent at or after zero.
    pub async fn start(&self, room_id: RoomId, secs: u32) {
        let mut running = self.running.lock().await;
        if let Some(previous) = running.remove(&room_id) {
            previous.abort();
            tracing::info!("Replacing running countdown for room '{}'", room_id);
        }

        let pusher = self.pusher.clone();
        let task_room_id = room_id.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first interval tick completes immediately; consume it so
            // the first broadcast happens one second after start.
            interval.tick().await;

            let mut remaining = secs;
            while remaining > 0 {
                interval.tick().await;
                let tick = serde_json::json!({
                    "type": "timeStart",
                    "message": remaining.to_string(),
                })
                .to_string();
                pusher.broadcast(&task_room_id, &tick).await;
                remaining -= 1;
            }
            tracing::debug!("Countdown for room '{}' expired", task_room_id);
        });

        running.insert(room_id, handle);
    }

    /// Cancel the room's countdown, if one is running. Called on room
    /// teardown.
    pub async fn cancel(&self, room_id: &RoomId) {
        let mut running = self.running.lock().await;
        if let Some(handle) = running.remove(room_id) {
            handle.abort();
            tracing::info!("Countdown for room '{}' cancelled", room_id);
        }
    }
}

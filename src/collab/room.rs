use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::locks::LockTable;
use super::registry::ConnectionRegistry;
use super::sessions::SessionDirectory;

/// Everything scoped to one document id
#[derive(Debug, Default)]
pub struct Room {
    pub connections: ConnectionRegistry,
    pub sessions: SessionDirectory,
    pub locks: LockTable,
    generation: u64,
    latest_xml: Option<String>,
}

impl Room {
    /// Distinguishes this room from earlier rooms opened under the same id.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Body of the most recent update relayed in this room, if any.
    pub fn latest_xml(&self) -> Option<&str> {
        self.latest_xml.as_deref()
    }

    pub fn set_latest_xml(&mut self, xml: String) {
        self.latest_xml = Some(xml);
    }

    /// Presence list as broadcast in `user_list`
    pub fn users(&self) -> Vec<String> {
        self.sessions.users(&self.connections)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HubStats {
    pub rooms: usize,
    pub connections: usize,
    pub sessions: usize,
    pub locks: usize,
}

/// All live rooms.
///
/// Each room sits behind its own mutex so traffic in one document never waits
/// on another. The outer map lock is only taken for writing when a room is
/// created or torn down; joins and teardown both hold it so a join can never
/// land in a room that is being removed.
///
/// Every room gets a fresh generation when it is opened. Members remember the
/// generation they joined, so a late disconnect never touches a newer room
/// that reuses the id.
#[derive(Debug, Default)]
pub struct Hub {
    rooms: RwLock<HashMap<String, Arc<Mutex<Room>>>>,
    next_generation: AtomicU64,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on the room, creating it first if needed.
    pub async fn enter<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> R {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(room_id.to_string()).or_insert_with(|| {
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("Opening room {} (generation {})", room_id, generation);
            Arc::new(Mutex::new(Room {
                generation,
                ..Room::default()
            }))
        });
        let mut room = room.lock().await;
        f(&mut room)
    }

    /// Run `f` on the room if it is still the given generation. `None` if the
    /// room is gone or was reopened since.
    pub async fn with_room<R>(
        &self,
        room_id: &str,
        generation: u64,
        f: impl FnOnce(&mut Room) -> R,
    ) -> Option<R> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(room_id)?;
        let mut room = room.lock().await;
        if room.generation != generation {
            return None;
        }
        Some(f(&mut room))
    }

    /// Like [`Hub::with_room`], then drop the room if no connection is left
    /// in it.
    pub async fn leave<R>(
        &self,
        room_id: &str,
        generation: u64,
        f: impl FnOnce(&mut Room) -> R,
    ) -> Option<R> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get(room_id)?.clone();
        let mut room = room.lock().await;
        if room.generation != generation {
            debug!("Room {} was reopened, skipping stale leave", room_id);
            return None;
        }
        let result = f(&mut room);
        if room.connections.is_empty() {
            rooms.remove(room_id);
            debug!("Closed room {}", room_id);
        }
        Some(result)
    }

    pub async fn contains(&self, room_id: &str) -> bool {
        self.rooms.read().await.contains_key(room_id)
    }

    pub async fn stats(&self) -> HubStats {
        let rooms = self.rooms.read().await;
        let mut stats = HubStats {
            rooms: rooms.len(),
            ..HubStats::default()
        };
        for room in rooms.values() {
            let room = room.lock().await;
            stats.connections += room.connections.len();
            stats.sessions += room.sessions.len();
            stats.locks += room.locks.len();
        }
        stats
    }
}

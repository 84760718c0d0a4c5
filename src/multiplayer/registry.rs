//! Room registry.
//!
//! Concurrency-safe directory of all live rooms. The map has its own lock
//! and every room sits behind its own `Arc<Mutex<_>>`, so the compound join
//! sequence runs as a single critical section per room while sweeps and
//! lookups on other rooms proceed independently. The map lock is never held
//! across a room lock, and no operation takes two room locks, so there is no
//! ordering cycle. All work under a lock is in-memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::multiplayer::room::Room;

/// Rooms older than this are removed by the default stale sweep.
pub const DEFAULT_ROOM_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Room id length.
pub const ROOM_ID_LEN: usize = 8;

const ROOM_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// A shared handle to one room.
pub type RoomHandle = Arc<Mutex<Room>>;

/// Lock a room handle. Poisoned guards are taken as-is: a panic in another
/// handler cannot leave room state structurally invalid.
pub fn lock_room(handle: &Mutex<Room>) -> MutexGuard<'_, Room> {
    handle.lock().unwrap_or_else(|e| e.into_inner())
}

/// Room registry - tracks all live rooms.
///
/// Constructed once at process start and passed into every handler; there
/// is no process-wide singleton.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, RoomHandle>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, RoomHandle>> {
        self.rooms.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a fresh waiting room under a collision-free id.
    fn insert_new(&self, level_id: u32) -> (String, RoomHandle) {
        let mut rooms = self.map();
        let id = loop {
            let candidate = generate_room_id();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let handle = Arc::new(Mutex::new(Room::new(id.clone(), level_id)));
        rooms.insert(id.clone(), handle.clone());
        drop(rooms);

        tracing::info!(room = %id, level = level_id, "created room");
        (id, handle)
    }

    /// Create a new waiting room and return its id.
    pub fn create_room(&self, level_id: u32) -> String {
        self.insert_new(level_id).0
    }

    /// Look up a live room.
    pub fn get_room(&self, room_id: &str) -> Option<RoomHandle> {
        self.map().get(room_id).cloned()
    }

    /// Some open room for the level (not started, with a free slot), or
    /// none. Any match is acceptable; no ordering guarantee.
    pub fn find_available_room(&self, level_id: u32) -> Option<RoomHandle> {
        let candidates: Vec<RoomHandle> = self.map().values().cloned().collect();
        for handle in candidates {
            let room = lock_room(&handle);
            if room.level_id == level_id && room.is_open() {
                drop(room);
                return Some(handle);
            }
        }
        None
    }

    /// Matchmaking: an open room for the level, or a fresh one.
    pub fn find_or_create(&self, level_id: u32) -> (String, RoomHandle) {
        if let Some(handle) = self.find_available_room(level_id) {
            let id = lock_room(&handle).id.clone();
            return (id, handle);
        }
        self.insert_new(level_id)
    }

    /// Remove every room whose creation timestamp is at least `max_age` old,
    /// regardless of lifecycle state. Returns the number removed.
    ///
    /// Safe to run concurrently with in-flight operations: a handle already
    /// resolved stays usable until dropped, and later lookups of a swept
    /// room report not-found.
    pub fn cleanup_stale(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let candidates: Vec<(String, RoomHandle)> = self
            .map()
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect();

        let mut stale = Vec::new();
        for (id, handle) in candidates {
            let room = lock_room(&handle);
            let expired = (now - room.created_at)
                .to_std()
                .map(|age| age >= max_age)
                .unwrap_or(false);
            if expired {
                stale.push(id);
            }
        }

        let mut rooms = self.map();
        let mut removed = 0;
        for id in &stale {
            if rooms.remove(id).is_some() {
                removed += 1;
            }
        }
        drop(rooms);

        if removed > 0 {
            tracing::info!(removed, "swept stale rooms");
        }
        removed
    }

    /// Remove finished rooms whose winner was recorded at least `grace` ago.
    /// Returns the number removed.
    pub fn cleanup_finished(&self, grace: Duration) -> usize {
        let now = Utc::now();
        let candidates: Vec<(String, RoomHandle)> = self
            .map()
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect();

        let mut done = Vec::new();
        for (id, handle) in candidates {
            let room = lock_room(&handle);
            let expired = room
                .finished_at()
                .and_then(|at| (now - at).to_std().ok())
                .map(|age| age >= grace)
                .unwrap_or(false);
            if expired {
                done.push(id);
            }
        }

        let mut rooms = self.map();
        let mut removed = 0;
        for id in &done {
            if rooms.remove(id).is_some() {
                removed += 1;
            }
        }
        drop(rooms);

        if removed > 0 {
            tracing::info!(removed, "swept finished rooms");
        }
        removed
    }

    /// Count live rooms.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    /// True when no rooms are live.
    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

/// Short room id: four random characters plus the tail of the epoch-millis
/// clock, truncated to `ROOM_ID_LEN`.
fn generate_room_id() -> String {
    let mut rng = rand::thread_rng();
    let random_part: String = (0..4)
        .map(|_| {
            let idx = rng.gen_range(0..ROOM_ID_ALPHABET.len());
            ROOM_ID_ALPHABET[idx] as char
        })
        .collect();
    let millis = Utc::now().timestamp_millis();
    let mut id = format!("{}{:06}", random_part, millis.rem_euclid(1_000_000));
    id.truncate(ROOM_ID_LEN);
    id
}

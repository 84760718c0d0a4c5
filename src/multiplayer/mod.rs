//! Multiplayer coordination module.
//!
//! The concurrent core of the server: ephemeral two-player rooms, the
//! registry that owns them, and the typed boundary surface handlers call.
//!
//! - `room` - One match: roster, shared board, lifecycle, win record.
//! - `registry` - Concurrency-safe directory of live rooms.
//! - `api` - Typed requests/responses and the handler operations.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       RoomRegistry                          │
//! │                                                             │
//! │   Mutex<HashMap<room_id, Arc<Mutex<Room>>>>                 │
//! │                  │                                          │
//! │                  │ resolve handle (map lock, released)      │
//! │                  ▼                                          │
//! │   ┌──────────────────────────┐   one lock per room; the     │
//! │   │ Room                     │   join sequence (admit +     │
//! │   │  players, phase, winner  │   start) and the winner      │
//! │   └──────────────────────────┘   check-then-set are each    │
//! │                                  a single critical section  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The map lock is never held across a room lock and no operation takes two
//! room locks, so registry sweeps run concurrently with in-flight joins and
//! updates against other rooms without any ordering cycle.

pub mod api;
pub mod registry;
pub mod room;

// Re-export commonly used types
pub use api::{
    ApiError, JoinRequest, JoinResponse, MoveRequest, MoveResponse, NextLevelResponse,
    ProgressUpdate, UpdateResponse,
};
pub use registry::{lock_room, RoomHandle, RoomRegistry, DEFAULT_ROOM_MAX_AGE, ROOM_ID_LEN};
pub use room::{
    Player, PlayerView, Room, RoomError, RoomPhase, RoomSnapshot, MAX_ROOM_PLAYERS,
};

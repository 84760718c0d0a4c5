//! Potion Sort State Library
//!
//! This crate provides the server-side core for Potion Sort, a
//! liquid-sorting puzzle game with two-player races.
//!
//! # Overview
//!
//! The crate splits into two halves:
//!
//! - **Pure puzzle logic** - The pour engine (move legality, the
//!   pour-all-matching transfer rule, win condition) and the level generator
//!   (shuffled, always-solvable boards with tiered difficulty).
//!
//! - **Multiplayer coordination** - Ephemeral two-player rooms, a
//!   concurrency-safe registry that creates, matches, and sweeps them, and
//!   a typed boundary surface for join / progress / next-level operations.
//!
//! # Design Principles
//!
//! 1. **Illegal lifecycle states are unrepresentable** - A room's board
//!    lives inside its `InProgress` phase, so "started with no puzzle"
//!    cannot be constructed; the winner is recorded at most once.
//!
//! 2. **One lock per room** - The compound join sequence and the winner
//!    check-then-set each run as a single critical section per room, while
//!    the registry's own lock covers only its map.
//!
//! 3. **No networking** - This crate is state and logic; HTTP routing,
//!    parsing, and CORS belong to the embedding process.
//!
//! 4. **Serialization-ready** - Requests deserialize at the boundary,
//!    snapshots and responses serialize for any client at any time.
//!
//! # Example
//!
//! ```rust
//! use potionsort_state::multiplayer::{api, api::JoinRequest, RoomRegistry};
//!
//! let registry = RoomRegistry::new();
//!
//! // First player opens a room through matchmaking.
//! let alice = api::join(&registry, JoinRequest {
//!     player_name: "Alice".to_string(),
//!     level_id: 1,
//!     room_id: None,
//! }).unwrap();
//! assert!(!alice.room_state.started);
//!
//! // Second player fills it; the match starts with a generated board.
//! let bob = api::join(&registry, JoinRequest {
//!     player_name: "Bob".to_string(),
//!     level_id: 1,
//!     room_id: Some(alice.room_id.clone()),
//! }).unwrap();
//! assert!(bob.room_state.started);
//! assert!(bob.bottles.is_some());
//! ```

pub mod logic;
pub mod multiplayer;

// Re-export both halves at the crate root
pub use logic::*;
pub use multiplayer::*;

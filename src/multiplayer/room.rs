//! Room state management.
//!
//! A room is one two-player match: the roster, the shared puzzle board, and
//! the win record. Rooms move through a one-way lifecycle:
//!
//! ```text
//! Waiting ──second player admitted──▶ InProgress ──winner recorded──▶ (finished)
//! ```
//!
//! "Finished" is not a stored flag; it is implied by `winner` being set, and
//! a finished room keeps accepting progress updates until it is swept.
//! Everything here is plain single-threaded state; concurrent access is the
//! registry's job, which wraps each room in its own lock.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::logic::pour::Bottles;

/// Players per match.
pub const MAX_ROOM_PLAYERS: usize = 2;

/// One player's slot in a room.
#[derive(Debug, Clone)]
pub struct Player {
    /// Opaque id handed out at join time
    pub id: String,

    /// Client-supplied display name, unvalidated
    pub name: String,

    /// Client-reported move count
    pub moves: u32,

    /// Whether this player has reported solving the board
    pub completed: bool,

    /// When the player was admitted
    pub joined_at: DateTime<Utc>,
}

impl Player {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            moves: 0,
            completed: false,
            joined_at: Utc::now(),
        }
    }
}

/// Where a room is in its lifecycle.
///
/// The board lives inside `InProgress`, so a started room without a puzzle
/// state is unrepresentable.
#[derive(Debug, Clone)]
pub enum RoomPhase {
    /// Fewer than two players, no board yet
    Waiting,

    /// Both players admitted, shared board assigned
    InProgress { bottles: Bottles },
}

/// Room errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    Full,
    AlreadyStarted,
    NotStarted,
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "Room is full"),
            Self::AlreadyStarted => write!(f, "Game has already started"),
            Self::NotStarted => write!(f, "Game has not started"),
        }
    }
}

impl std::error::Error for RoomError {}

/// Room state.
#[derive(Debug, Clone)]
pub struct Room {
    /// Unique id among currently-live rooms
    pub id: String,

    /// Level both players race on
    pub level_id: u32,

    /// Roster in join order
    players: Vec<Player>,

    /// Lifecycle phase
    phase: RoomPhase,

    /// First player to report completion; set at most once, never reassigned
    winner: Option<String>,

    /// When the winner was recorded
    finished_at: Option<DateTime<Utc>>,

    /// When the room was created
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Create a new waiting room.
    pub fn new(id: String, level_id: u32) -> Self {
        Self {
            id,
            level_id,
            players: Vec::new(),
            phase: RoomPhase::Waiting,
            winner: None,
            finished_at: None,
            created_at: Utc::now(),
        }
    }

    /// Admit a player. Fails without mutation once the roster is full.
    pub fn add_player(&mut self, id: String, name: String) -> Result<(), RoomError> {
        if self.players.len() >= MAX_ROOM_PLAYERS {
            return Err(RoomError::Full);
        }
        self.players.push(Player::new(id, name));
        Ok(())
    }

    /// True iff both slots are filled and the game has not started yet.
    pub fn can_start(&self) -> bool {
        self.players.len() == MAX_ROOM_PLAYERS && !self.started()
    }

    /// Assign the shared board and flip to `InProgress`.
    ///
    /// Starting twice is rejected rather than overwriting the board of a
    /// match already underway.
    pub fn start_game(&mut self, bottles: Bottles) -> Result<(), RoomError> {
        if self.started() {
            return Err(RoomError::AlreadyStarted);
        }
        self.phase = RoomPhase::InProgress { bottles };
        Ok(())
    }

    /// Replace the shared board with a client-submitted one.
    ///
    /// Last write wins, no merge: the submitting client's device is the
    /// source of truth for the shared board after each move. The payload is
    /// trusted verbatim; it is not re-validated against the pour engine.
    pub fn update_bottles(&mut self, bottles: Bottles) -> Result<(), RoomError> {
        match &mut self.phase {
            RoomPhase::Waiting => Err(RoomError::NotStarted),
            RoomPhase::InProgress { bottles: shared } => {
                *shared = bottles;
                Ok(())
            }
        }
    }

    /// Set a player's move counter. No-op for an unknown player.
    pub fn update_player_move(&mut self, player_id: &str, moves: u32) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
            player.moves = moves;
        }
    }

    /// Mark a player as finished and record the winner if none exists.
    ///
    /// Returns true when this call set the winner. Later completions update
    /// the player's own flag but never reassign the winner.
    pub fn mark_player_complete(&mut self, player_id: &str) -> bool {
        let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) else {
            return false;
        };
        player.completed = true;

        if self.winner.is_none() {
            self.winner = Some(player_id.to_string());
            self.finished_at = Some(Utc::now());
            true
        } else {
            false
        }
    }

    /// Move a finished match on to a fresh level.
    ///
    /// Clears the winner, resets every player's progress, and goes straight
    /// to `InProgress` with the new board. There is no second waiting
    /// phase; both players are already in the room.
    pub fn advance_level(&mut self, level_id: u32, bottles: Bottles) {
        self.level_id = level_id;
        self.winner = None;
        self.finished_at = None;
        for player in &mut self.players {
            player.moves = 0;
            player.completed = false;
        }
        self.phase = RoomPhase::InProgress { bottles };
    }

    /// Whether the game has started.
    pub fn started(&self) -> bool {
        matches!(self.phase, RoomPhase::InProgress { .. })
    }

    /// The shared board, if the game has started.
    pub fn bottles(&self) -> Option<&Bottles> {
        match &self.phase {
            RoomPhase::Waiting => None,
            RoomPhase::InProgress { bottles } => Some(bottles),
        }
    }

    /// The winner's player id, if one has been recorded.
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// When the winner was recorded, if one has been.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// True while the room can still admit a player through matchmaking.
    pub fn is_open(&self) -> bool {
        self.players.len() < MAX_ROOM_PLAYERS && !self.started()
    }

    /// Check if a player is on the roster.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// Roster in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Roster size.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Read-only projection safe to serialize for any client at any time.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            level_id: self.level_id,
            started: self.started(),
            winner: self.winner.clone(),
            bottles: self.bottles().cloned(),
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    moves: p.moves,
                    completed: p.completed,
                })
                .collect(),
        }
    }
}

/// Serializable view of a room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub level_id: u32,
    pub started: bool,
    pub winner: Option<String>,
    pub bottles: Option<Bottles>,
    pub players: Vec<PlayerView>,
}

/// Serializable view of one player.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub moves: u32,
    pub completed: bool,
}

//! Boundary operations.
//!
//! Typed request/response shapes and the handler functions a transport
//! layer calls. Handlers take the registry explicitly (there is no
//! process-wide singleton) and only ever see already-parsed values;
//! malformed payloads are the transport's problem. Every failure is a typed
//! `ApiError`, none is process-fatal, and a failed request cannot corrupt
//! room or registry state for concurrent requests.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::level::{generate_level, Level, MAX_LEVEL};
use crate::logic::pour::{check_completion, validate_move, Bottles};
use crate::multiplayer::registry::{lock_room, RoomRegistry};
use crate::multiplayer::room::RoomSnapshot;

/// Boundary errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Unknown or already-swept room
    RoomNotFound,

    /// Both slots were taken by the time the join reached the room
    RoomFull,

    /// Board submitted for a room still waiting for its second player
    NotStarted,

    /// No level configured past the ceiling
    LevelCeilingExceeded,

    /// A field failed boundary validation
    Validation(&'static str),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomNotFound => write!(f, "Room not found"),
            Self::RoomFull => write!(f, "Room is full"),
            Self::NotStarted => write!(f, "Game has not started"),
            Self::LevelCeilingExceeded => {
                write!(f, "Level not found. Levels 1-{} available.", MAX_LEVEL)
            }
            Self::Validation(reason) => write!(f, "Invalid request: {}", reason),
        }
    }
}

impl std::error::Error for ApiError {}

/// Join or create a multiplayer room.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    pub player_name: String,
    pub level_id: u32,
    #[serde(default)]
    pub room_id: Option<String>,
}

/// Result of a join.
#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub room_id: String,
    pub player_id: String,
    /// The shared board, present once the match has started
    pub bottles: Option<Bottles>,
    pub room_state: RoomSnapshot,
}

/// A player's progress report.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressUpdate {
    pub room_id: String,
    pub player_id: String,
    pub moves: u32,
    /// Replacement for the shared board; trusted verbatim
    #[serde(default)]
    pub bottles: Option<Bottles>,
    #[serde(default)]
    pub completed: bool,
}

/// Result of a progress update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub room_state: RoomSnapshot,
}

/// Result of advancing a room to its next level.
#[derive(Debug, Clone, Serialize)]
pub struct NextLevelResponse {
    pub level_id: u32,
    pub bottles: Bottles,
    pub room_state: RoomSnapshot,
}

/// A single-player move against a client-held board.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    pub bottles: Bottles,
    pub from_bottle: usize,
    pub to_bottle: usize,
}

/// Result of a single-player move. An illegal move is not an error; the
/// board comes back unchanged with `success` false.
#[derive(Debug, Clone, Serialize)]
pub struct MoveResponse {
    pub success: bool,
    pub bottles: Bottles,
    pub is_completed: bool,
    pub message: Option<String>,
}

/// Join a room, by explicit id or through matchmaking.
///
/// Admission and game start form one critical section per room: two racing
/// joins cannot both observe the last free slot, and the second admission
/// starts the game exactly once. A room that filled between matchmaking
/// resolution and admission reports `RoomFull` rather than overfilling.
pub fn join(registry: &RoomRegistry, request: JoinRequest) -> Result<JoinResponse, ApiError> {
    if request.player_name.trim().is_empty() {
        return Err(ApiError::Validation("player_name must not be empty"));
    }

    let (room_id, handle) = match &request.room_id {
        Some(id) => {
            let handle = registry.get_room(id).ok_or(ApiError::RoomNotFound)?;
            (id.clone(), handle)
        }
        None => registry.find_or_create(request.level_id),
    };

    let player_id = Uuid::new_v4().to_string();

    let mut room = lock_room(&handle);
    if room
        .add_player(player_id.clone(), request.player_name.clone())
        .is_err()
    {
        return Err(ApiError::RoomFull);
    }

    if room.can_start() {
        let level = generate_level(room.level_id);
        match room.start_game(level.bottles) {
            Ok(()) => {
                tracing::info!(room = %room.id, level = room.level_id, "match started")
            }
            Err(err) => tracing::warn!(room = %room.id, error = %err, "start rejected"),
        }
    }

    let snapshot = room.snapshot();
    drop(room);

    tracing::debug!(room = %room_id, player = %player_id, "player joined");
    Ok(JoinResponse {
        room_id,
        player_id,
        bottles: snapshot.bottles.clone(),
        room_state: snapshot,
    })
}

/// Current snapshot of a room.
pub fn room_state(registry: &RoomRegistry, room_id: &str) -> Result<RoomSnapshot, ApiError> {
    let handle = registry.get_room(room_id).ok_or(ApiError::RoomNotFound)?;
    let room = lock_room(&handle);
    Ok(room.snapshot())
}

/// Apply a player's progress report to their room.
///
/// Updates after a winner exists still land on the reporting player but can
/// never reassign the winner.
pub fn submit_progress(
    registry: &RoomRegistry,
    update: ProgressUpdate,
) -> Result<UpdateResponse, ApiError> {
    let handle = registry
        .get_room(&update.room_id)
        .ok_or(ApiError::RoomNotFound)?;

    let mut room = lock_room(&handle);
    room.update_player_move(&update.player_id, update.moves);

    if let Some(bottles) = update.bottles {
        room.update_bottles(bottles)
            .map_err(|_| ApiError::NotStarted)?;
    }

    if update.completed && room.mark_player_complete(&update.player_id) {
        tracing::info!(room = %room.id, winner = %update.player_id, "winner recorded");
    }

    Ok(UpdateResponse {
        success: true,
        room_state: room.snapshot(),
    })
}

/// Advance a room to the next level.
///
/// Resets the win record and every player's progress, then re-enters play
/// directly with a fresh board, all under the room's lock like any other
/// room mutation.
pub fn advance_level(
    registry: &RoomRegistry,
    room_id: &str,
) -> Result<NextLevelResponse, ApiError> {
    let handle = registry.get_room(room_id).ok_or(ApiError::RoomNotFound)?;

    let mut room = lock_room(&handle);
    let next = room.level_id.saturating_add(1);
    if next > MAX_LEVEL {
        return Err(ApiError::LevelCeilingExceeded);
    }

    let Level { bottles, .. } = generate_level(next);
    room.advance_level(next, bottles.clone());
    tracing::info!(room = %room.id, level = next, "advanced to next level");

    Ok(NextLevelResponse {
        level_id: next,
        bottles,
        room_state: room.snapshot(),
    })
}

/// Fetch a level for single-player play.
pub fn get_level(level_id: u32) -> Result<Level, ApiError> {
    if level_id == 0 || level_id > MAX_LEVEL {
        return Err(ApiError::LevelCeilingExceeded);
    }
    Ok(generate_level(level_id))
}

/// Validate and apply a single-player move.
pub fn make_move(request: MoveRequest) -> MoveResponse {
    match validate_move(&request.bottles, request.from_bottle, request.to_bottle) {
        Ok(bottles) => {
            let is_completed = check_completion(&bottles);
            MoveResponse {
                success: true,
                bottles,
                is_completed,
                message: None,
            }
        }
        Err(err) => MoveResponse {
            success: false,
            bottles: request.bottles,
            is_completed: false,
            message: Some(err.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    fn join_request(name: &str, level_id: u32, room_id: Option<&str>) -> JoinRequest {
        JoinRequest {
            player_name: name.to_string(),
            level_id,
            room_id: room_id.map(|s| s.to_string()),
        }
    }

    fn progress(room_id: &str, player_id: &str, moves: u32, completed: bool) -> ProgressUpdate {
        ProgressUpdate {
            room_id: room_id.to_string(),
            player_id: player_id.to_string(),
            moves,
            bottles: None,
            completed,
        }
    }

    #[test]
    fn test_join_blank_name_rejected() {
        let registry = RoomRegistry::new();
        let result = join(&registry, join_request("   ", 1, None));
        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_join_unknown_room() {
        let registry = RoomRegistry::new();
        let result = join(&registry, join_request("Alice", 1, Some("missing1")));
        assert_eq!(result.unwrap_err(), ApiError::RoomNotFound);
    }

    #[test]
    fn test_matchmaking_pairs_players() {
        let registry = RoomRegistry::new();

        let alice = join(&registry, join_request("Alice", 1, None)).unwrap();
        assert!(!alice.room_state.started);
        assert!(alice.bottles.is_none());

        let bob = join(&registry, join_request("Bob", 1, None)).unwrap();
        assert_eq!(bob.room_id, alice.room_id);
        assert!(bob.room_state.started);
        assert!(bob.bottles.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_matchmaking_ignores_other_levels() {
        let registry = RoomRegistry::new();

        let alice = join(&registry, join_request("Alice", 1, None)).unwrap();
        let carol = join(&registry, join_request("Carol", 2, None)).unwrap();
        assert_ne!(alice.room_id, carol.room_id);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_third_join_capacity_rejected() {
        let registry = RoomRegistry::new();

        let alice = join(&registry, join_request("Alice", 1, None)).unwrap();
        join(&registry, join_request("Bob", 1, Some(&alice.room_id))).unwrap();

        let result = join(&registry, join_request("Carol", 1, Some(&alice.room_id)));
        assert_eq!(result.unwrap_err(), ApiError::RoomFull);

        let snap = room_state(&registry, &alice.room_id).unwrap();
        assert_eq!(snap.players.len(), 2);
    }

    #[test]
    fn test_full_match_flow() {
        let registry = RoomRegistry::new();

        let alice = join(&registry, join_request("Alice", 1, None)).unwrap();
        let bob = join(&registry, join_request("Bob", 1, Some(&alice.room_id))).unwrap();

        // Bob finishes first and takes the match.
        let after_bob = submit_progress(&registry, progress(&alice.room_id, &bob.player_id, 14, true))
            .unwrap();
        assert_eq!(after_bob.room_state.winner.as_deref(), Some(bob.player_id.as_str()));

        // Alice finishing later keeps her own flag, never the win.
        let after_alice =
            submit_progress(&registry, progress(&alice.room_id, &alice.player_id, 20, true))
                .unwrap();
        assert_eq!(
            after_alice.room_state.winner.as_deref(),
            Some(bob.player_id.as_str())
        );
        assert!(after_alice.room_state.players.iter().all(|p| p.completed));
    }

    #[test]
    fn test_submit_progress_unknown_room() {
        let registry = RoomRegistry::new();
        let result = submit_progress(&registry, progress("missing1", "p", 1, false));
        assert_eq!(result.unwrap_err(), ApiError::RoomNotFound);
    }

    #[test]
    fn test_submit_bottles_replaces_shared_board() {
        let registry = RoomRegistry::new();
        let alice = join(&registry, join_request("Alice", 1, None)).unwrap();
        let _bob = join(&registry, join_request("Bob", 1, Some(&alice.room_id))).unwrap();

        let replacement = vec![vec!["#FF0000".to_string()], vec![]];
        let mut update = progress(&alice.room_id, &alice.player_id, 1, false);
        update.bottles = Some(replacement.clone());

        let response = submit_progress(&registry, update).unwrap();
        assert_eq!(response.room_state.bottles, Some(replacement));
    }

    #[test]
    fn test_submit_bottles_before_start() {
        let registry = RoomRegistry::new();
        let alice = join(&registry, join_request("Alice", 1, None)).unwrap();

        let mut update = progress(&alice.room_id, &alice.player_id, 0, false);
        update.bottles = Some(vec![vec![]]);
        let result = submit_progress(&registry, update);
        assert_eq!(result.unwrap_err(), ApiError::NotStarted);
    }

    #[test]
    fn test_advance_level_resets_match() {
        let registry = RoomRegistry::new();
        let alice = join(&registry, join_request("Alice", 1, None)).unwrap();
        let bob = join(&registry, join_request("Bob", 1, Some(&alice.room_id))).unwrap();
        submit_progress(&registry, progress(&alice.room_id, &bob.player_id, 9, true)).unwrap();

        let next = advance_level(&registry, &alice.room_id).unwrap();
        assert_eq!(next.level_id, 2);
        assert!(!next.bottles.is_empty());
        assert!(next.room_state.started);
        assert!(next.room_state.winner.is_none());
        assert!(next
            .room_state
            .players
            .iter()
            .all(|p| p.moves == 0 && !p.completed));
    }

    #[test]
    fn test_advance_level_ceiling() {
        let registry = RoomRegistry::new();
        let alice = join(&registry, join_request("Alice", MAX_LEVEL, None)).unwrap();
        join(&registry, join_request("Bob", MAX_LEVEL, Some(&alice.room_id))).unwrap();

        let result = advance_level(&registry, &alice.room_id);
        assert_eq!(result.unwrap_err(), ApiError::LevelCeilingExceeded);
    }

    #[test]
    fn test_advance_level_unknown_room() {
        let registry = RoomRegistry::new();
        let result = advance_level(&registry, "missing1");
        assert_eq!(result.unwrap_err(), ApiError::RoomNotFound);
    }

    #[test]
    fn test_get_level_bounds() {
        assert!(get_level(0).is_err());
        assert!(get_level(MAX_LEVEL + 1).is_err());
        assert_eq!(get_level(1).unwrap().level_id, 1);
        assert_eq!(get_level(MAX_LEVEL).unwrap().level_id, MAX_LEVEL);
    }

    #[test]
    fn test_progress_update_deserializes_with_defaults() {
        let update: ProgressUpdate = serde_json::from_value(serde_json::json!({
            "room_id": "r1",
            "player_id": "p1",
            "moves": 3
        }))
        .unwrap();
        assert!(update.bottles.is_none());
        assert!(!update.completed);

        let join: JoinRequest = serde_json::from_value(serde_json::json!({
            "player_name": "Alice",
            "level_id": 1
        }))
        .unwrap();
        assert!(join.room_id.is_none());
    }

    #[test]
    fn test_make_move_legal_and_illegal() {
        let board = vec![vec!["A".to_string(), "A".to_string()], vec![]];

        let legal = make_move(MoveRequest {
            bottles: board.clone(),
            from_bottle: 0,
            to_bottle: 1,
        });
        assert!(legal.success);
        assert!(legal.bottles[0].is_empty());

        let illegal = make_move(MoveRequest {
            bottles: board.clone(),
            from_bottle: 1,
            to_bottle: 0,
        });
        assert!(!illegal.success);
        assert!(!illegal.is_completed);
        assert_eq!(illegal.bottles, board);
        assert!(illegal.message.is_some());
    }

    #[test]
    fn test_make_move_reports_completion() {
        let board = vec![
            vec!["A".to_string(), "A".to_string(), "A".to_string()],
            vec!["A".to_string()],
        ];
        let response = make_move(MoveRequest {
            bottles: board,
            from_bottle: 0,
            to_bottle: 1,
        });
        assert!(response.success);
        assert!(response.is_completed);
    }

    #[test]
    fn test_concurrent_joins_admit_exactly_two() {
        let registry = Arc::new(RoomRegistry::new());
        let room_id = registry.create_room(1);

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let room_id = room_id.clone();
                thread::spawn(move || {
                    join(
                        &registry,
                        JoinRequest {
                            player_name: format!("Player{}", i),
                            level_id: 1,
                            room_id: Some(room_id),
                        },
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let admitted = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(ApiError::RoomFull)))
            .count();

        assert_eq!(admitted, 2);
        assert_eq!(rejected, 1);

        let snap = room_state(&registry, &room_id).unwrap();
        assert_eq!(snap.players.len(), 2);
        assert!(snap.started);
        assert!(snap.bottles.is_some());
    }

    #[test]
    fn test_concurrent_completion_single_winner() {
        let registry = Arc::new(RoomRegistry::new());
        let alice = join(&registry, join_request("Alice", 1, None)).unwrap();
        let bob = join(&registry, join_request("Bob", 1, Some(&alice.room_id))).unwrap();

        let racers: Vec<_> = [alice.player_id.clone(), bob.player_id.clone()]
            .into_iter()
            .map(|player_id| {
                let registry = Arc::clone(&registry);
                let room_id = alice.room_id.clone();
                thread::spawn(move || {
                    submit_progress(
                        &registry,
                        ProgressUpdate {
                            room_id,
                            player_id,
                            moves: 10,
                            bottles: None,
                            completed: true,
                        },
                    )
                })
            })
            .collect();
        for racer in racers {
            racer.join().unwrap().unwrap();
        }

        let snap = room_state(&registry, &alice.room_id).unwrap();
        let winner = snap.winner.expect("a completion occurred, so a winner exists");
        assert!(winner == alice.player_id || winner == bob.player_id);
        assert!(snap.players.iter().all(|p| p.completed));
    }
}

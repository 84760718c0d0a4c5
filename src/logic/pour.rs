//! Pour physics.
//!
//! Pure functions over an array-of-stacks board: legality checks, the
//! pour-all-matching transfer rule, and the win condition. No hidden state
//! and no I/O, so any sequence of moves can be replayed deterministically.

use std::fmt;

/// Units a bottle can hold.
pub const BOTTLE_CAPACITY: usize = 4;

/// A single bottle: ordered stack of color ids, bottom to top.
pub type Bottle = Vec<String>;

/// A whole board. The bottle index is the stable identity used in moves.
pub type Bottles = Vec<Bottle>;

/// Why a pour was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    OutOfBounds,
    SameBottle,
    SourceEmpty,
    DestinationFull,
    ColorMismatch,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "Bottle index out of bounds"),
            Self::SameBottle => write!(f, "Cannot pour a bottle into itself"),
            Self::SourceEmpty => write!(f, "Source bottle is empty"),
            Self::DestinationFull => write!(f, "Destination bottle is full"),
            Self::ColorMismatch => write!(f, "Top colors do not match"),
        }
    }
}

impl std::error::Error for MoveError {}

/// Validate a pour and compute the resulting board.
///
/// The input is never mutated; on rejection the caller keeps its board
/// unchanged. A legal pour moves the whole run of matching colors from the
/// top of `from`, capped by the free space in `to`. Pouring all matching
/// units at once (rather than a single unit) is the game's distinguishing
/// rule.
pub fn validate_move(bottles: &[Bottle], from: usize, to: usize) -> Result<Bottles, MoveError> {
    if from >= bottles.len() || to >= bottles.len() {
        return Err(MoveError::OutOfBounds);
    }
    if from == to {
        return Err(MoveError::SameBottle);
    }

    let source = &bottles[from];
    let dest = &bottles[to];

    let top = source.last().ok_or(MoveError::SourceEmpty)?;
    if dest.len() >= BOTTLE_CAPACITY {
        return Err(MoveError::DestinationFull);
    }
    if let Some(dest_top) = dest.last() {
        if dest_top != top {
            return Err(MoveError::ColorMismatch);
        }
    }

    // Run length of the top color, counted downward from the top.
    let run = source.iter().rev().take_while(|c| *c == top).count();
    let space = BOTTLE_CAPACITY - dest.len();
    let amount = run.min(space);

    let mut next = bottles.to_vec();
    for _ in 0..amount {
        if let Some(unit) = next[from].pop() {
            next[to].push(unit);
        }
    }

    Ok(next)
}

/// True when every bottle is empty or filled to capacity with one color.
/// A board with no bottles is trivially complete.
pub fn check_completion(bottles: &[Bottle]) -> bool {
    bottles.iter().all(|bottle| {
        bottle.is_empty()
            || (bottle.len() == BOTTLE_CAPACITY && bottle.iter().all(|c| c == &bottle[0]))
    })
}

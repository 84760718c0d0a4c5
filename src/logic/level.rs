//! Level generation.
//!
//! Deals a shuffled but always-solvable board for a given level id: every
//! color appears exactly `BOTTLE_CAPACITY` times, a couple of bottles start
//! empty, and at least one bottle is guaranteed to need sorting. Difficulty
//! scales with the level id through a fixed tier table.

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::logic::pour::{Bottle, Bottles, BOTTLE_CAPACITY};

/// Highest configured level.
pub const MAX_LEVEL: u32 = 120;

/// Suggested move budget reported with each level.
pub const DEFAULT_MOVE_BUDGET: u32 = 20;

/// High-contrast color palette, in tier order.
const PALETTE: [&str; 12] = [
    "#FF0000", // red
    "#00FF00", // green
    "#0000FF", // blue
    "#FFFF00", // yellow
    "#FF00FF", // magenta
    "#00FFFF", // cyan
    "#FFA500", // orange
    "#800080", // purple
    "#FFD700", // gold
    "#FF1493", // pink
    "#8B4513", // brown
    "#00CED1", // turquoise
];

/// A generated level and its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Level {
    pub level_id: u32,
    pub bottles: Bottles,
    pub max_capacity: usize,
    pub color_count: usize,
    pub optimal_moves: u32,
}

/// (full bottles, empty bottles, colors) for a level id.
///
/// Bands of twenty levels each; ids past the table use the hardest band.
fn tier(level_id: u32) -> (usize, usize, usize) {
    match level_id {
        0..=20 => (3, 2, 3),
        21..=40 => (4, 2, 4),
        41..=60 => (5, 2, 5),
        61..=80 => (6, 2, 6),
        81..=100 => (7, 3, 7),
        _ => (8, 3, 8),
    }
}

/// Generate a board for a level.
///
/// Random per call; two calls with the same id may produce different
/// layouts. Every output satisfies the solvability invariants: each color's
/// total count is an exact multiple of the capacity, at least one bottle is
/// empty, and at least one non-empty bottle holds more than one color (a
/// pre-sorted deal is thrown away and re-dealt).
pub fn generate_level(level_id: u32) -> Level {
    let (full, empty, colors) = tier(level_id);
    let mut rng = rand::thread_rng();

    let bottles = loop {
        let mut pieces: Vec<String> = Vec::with_capacity(full * BOTTLE_CAPACITY);
        for color in PALETTE.iter().take(colors) {
            for _ in 0..BOTTLE_CAPACITY {
                pieces.push((*color).to_string());
            }
        }
        pieces.shuffle(&mut rng);

        let mut board: Bottles = pieces
            .chunks(BOTTLE_CAPACITY)
            .map(|chunk| chunk.to_vec())
            .collect();
        for _ in 0..empty {
            board.push(Bottle::new());
        }
        board.shuffle(&mut rng);

        if board
            .iter()
            .any(|b| !b.is_empty() && b.iter().any(|c| c != &b[0]))
        {
            break board;
        }
    };

    Level {
        level_id,
        bottles,
        max_capacity: BOTTLE_CAPACITY,
        color_count: colors,
        optimal_moves: DEFAULT_MOVE_BUDGET,
    }
}

use std::fmt::Display;

pub mod grid;
pub mod player;
pub mod state;

/// Seats in the player table, aliased `'A'..='Z'` by join order.
pub const MAX_PLAYERS: usize = 26;
/// Longest accepted real name, in bytes.
pub const MAX_NAME_LEN: usize = 50;

/// Nuggets distributed over all piles at setup.
pub const GOLD_TOTAL: u32 = 250;
pub const GOLD_MIN_PILES: u32 = 10;
pub const GOLD_MAX_PILES: u32 = 30;

pub use grid::{Dir, Grid, Pos, Tile};
pub use player::{Alias, Player};

#[derive(Debug)]
pub enum Error {
    /// The map file has no lines.
    EmptyMap,
    /// A map line differs in width from the first line.
    RaggedMap {
        line: usize,
        width: usize,
        expected: usize,
    },
    /// All 26 seats are taken.
    GameFull,
    /// `PLAY` carried a whitespace-only name.
    EmptyName,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::EmptyMap => write!(f, "map file is empty"),
            Error::RaggedMap {
                line,
                width,
                expected,
            } => write!(
                f,
                "map line {line} is {width} columns wide, expected {expected}"
            ),
            Error::GameFull => write!(f, "game is full"),
            Error::EmptyName => write!(f, "player name is empty"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

//! Core domain types for the seat trap client

use serde::{Deserialize, Serialize};

pub mod game_state;

pub use game_state::*;

/// ---------- Common type aliases ----------
pub type GameId = String;
pub type PlayerId = String;
pub type SeatNumber = u32;

/// Seat pinned to the top of the circle whenever it is still available.
pub const TOP_SEAT: SeatNumber = 12;

/// Seats offered when a game is created without an explicit set.
pub fn default_seats() -> Vec<SeatNumber> {
    (1..=TOP_SEAT).collect()
}

/// ---------- Enums ----------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Waiting,
    SettingTrap,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Cpu,
    Friend,
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Cpu => f.write_str("cpu"),
            GameMode::Friend => f.write_str("friend"),
        }
    }
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(GameMode::Cpu),
            "friend" => Ok(GameMode::Friend),
            other => Err(format!("unknown game mode `{other}` (expected cpu or friend)")),
        }
    }
}

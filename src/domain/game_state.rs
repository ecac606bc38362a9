//! Game snapshot types as pushed and served by the game service

use super::*;
use serde::{Deserialize, Serialize};

/// Opaque participant identity. Not validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: PlayerId,
    #[serde(default)]
    pub name: String,
}

/// Per-player score line.
///
/// `is_resetted` is level-triggered: the service raises it when a trap wiped this
/// player's score and keeps it raised across snapshots until it clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameScore {
    pub id: String,
    pub player_id: PlayerId,
    pub score: i64,
    pub failures: u32,
    #[serde(default)]
    pub is_resetted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trap {
    pub seat_number: SeatNumber,
}

/// A complete snapshot of one game. Always replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub player1: User,
    pub player2: User,
    pub status: GameStatus,
    pub current_turn: PlayerId,
    #[serde(default)]
    pub available_seats: Vec<SeatNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<User>,
    #[serde(default)]
    pub scores: Vec<GameScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trap: Option<Trap>,
}

impl Game {
    pub fn score_of(&self, player_id: &str) -> Option<&GameScore> {
        self.scores.iter().find(|s| s.player_id == player_id)
    }

    /// First score line that does not belong to `player_id`.
    pub fn opponent_score_of(&self, player_id: &str) -> Option<&GameScore> {
        self.scores.iter().find(|s| s.player_id != player_id)
    }

    pub fn is_participant(&self, player_id: &str) -> bool {
        self.player1.id == player_id || self.player2.id == player_id
    }

    pub fn is_seat_available(&self, seat: SeatNumber) -> bool {
        self.available_seats.contains(&seat)
    }

    pub fn is_turn_of(&self, player_id: &str) -> bool {
        self.current_turn == player_id
    }
}

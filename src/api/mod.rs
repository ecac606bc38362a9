//! Request/response surface of the game service.

use serde::{Deserialize, Serialize};

use crate::domain::{Game, GameMode, PlayerId, SeatNumber};

pub mod error;
pub mod http;

pub use error::{Operation, RequestError};
pub use http::HttpGameApi;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub player1_id: PlayerId,
    pub game_mode: GameMode,
    pub available_seats: Vec<SeatNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    pub player_id: PlayerId,
}

/// Body shared by the trap and select calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatRequest {
    pub player_id: PlayerId,
    pub seat_number: SeatNumber,
}

/// Calls against the authoritative game service.
///
/// Each call is a single attempt. Move calls report success only; whatever
/// snapshot the service echoes back is ignored, the push path delivers it.
#[async_trait::async_trait]
pub trait GameApi: Send + Sync {
    async fn create_game(&self, request: CreateGameRequest) -> Result<Game, RequestError>;

    async fn join_game(&self, game_id: &str, request: JoinGameRequest)
        -> Result<(), RequestError>;

    async fn fetch_game(&self, game_id: &str) -> Result<Game, RequestError>;

    async fn place_trap(&self, game_id: &str, request: SeatRequest) -> Result<(), RequestError>;

    async fn select_seat(&self, game_id: &str, request: SeatRequest)
        -> Result<(), RequestError>;
}

pub fn seat_request(player_id: &str, seat_number: SeatNumber) -> SeatRequest {
    SeatRequest {
        player_id: player_id.to_string(),
        seat_number,
    }
}

pub fn create_request(player_id: &str, mode: GameMode, seats: Vec<SeatNumber>) -> CreateGameRequest {
    CreateGameRequest {
        player1_id: player_id.to_string(),
        game_mode: mode,
        available_seats: seats,
    }
}

pub type SharedGameApi = std::sync::Arc<dyn GameApi>;

use tracing::{info, warn};

use crate::api::{seat_request, RequestError, SharedGameApi};
use crate::domain::{Game, GameId, PlayerId, SeatNumber};
use crate::engine::{classify, LegalAction};

const LOG_TARGET: &str = "seat_trap::dispatch";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("{attempted} is not legal now (legal: {legal})")]
    IllegalAction {
        attempted: LegalAction,
        legal: LegalAction,
    },
    #[error("seat {seat} is not available")]
    SeatUnavailable { seat: SeatNumber },
    #[error(transparent)]
    RequestFailed(#[from] RequestError),
}

impl DispatchError {
    /// Whether the action was stopped locally, before anything was sent.
    pub fn is_suppressed(&self) -> bool {
        !matches!(self, DispatchError::RequestFailed(_))
    }
}

/// Sends the two player moves for one game on behalf of one player.
///
/// Moves are gated by the local classification of the snapshot passed in;
/// the response is never applied locally and nothing is retried.
#[derive(Clone)]
pub struct ActionDispatcher {
    api: SharedGameApi,
    game_id: GameId,
    player_id: PlayerId,
}

impl ActionDispatcher {
    pub fn new(api: SharedGameApi, game_id: impl Into<GameId>, player_id: impl Into<PlayerId>) -> Self {
        Self {
            api,
            game_id: game_id.into(),
            player_id: player_id.into(),
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub async fn place_trap(&self, game: &Game, seat: SeatNumber) -> Result<(), DispatchError> {
        self.check(game, LegalAction::PlaceTrap, seat)?;
        let request = seat_request(&self.player_id, seat);
        self.api
            .place_trap(&self.game_id, request)
            .await
            .map_err(|err| self.failed(LegalAction::PlaceTrap, err))?;
        info!(target: LOG_TARGET, game_id = %self.game_id, seat, "trap placed");
        Ok(())
    }

    pub async fn select_seat(&self, game: &Game, seat: SeatNumber) -> Result<(), DispatchError> {
        self.check(game, LegalAction::SelectSeat, seat)?;
        let request = seat_request(&self.player_id, seat);
        self.api
            .select_seat(&self.game_id, request)
            .await
            .map_err(|err| self.failed(LegalAction::SelectSeat, err))?;
        info!(target: LOG_TARGET, game_id = %self.game_id, seat, "seat selected");
        Ok(())
    }

    /// The move that would be sent for `game` right now, if any.
    pub fn legal_action(&self, game: &Game) -> LegalAction {
        classify(game, &self.player_id).legal_action
    }

    fn check(&self, game: &Game, attempted: LegalAction, seat: SeatNumber) -> Result<(), DispatchError> {
        let legal = self.legal_action(game);
        if legal != attempted {
            info!(
                target: LOG_TARGET,
                game_id = %self.game_id,
                %attempted,
                %legal,
                "suppressing out-of-turn action"
            );
            return Err(DispatchError::IllegalAction { attempted, legal });
        }
        if !game.is_seat_available(seat) {
            info!(target: LOG_TARGET, game_id = %self.game_id, seat, "suppressing unavailable seat");
            return Err(DispatchError::SeatUnavailable { seat });
        }
        Ok(())
    }

    fn failed(&self, action: LegalAction, err: RequestError) -> DispatchError {
        warn!(target: LOG_TARGET, game_id = %self.game_id, %action, error = %err, "action request failed");
        DispatchError::RequestFailed(err)
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("game_id", &self.game_id)
            .field("player_id", &self.player_id)
            .finish_non_exhaustive()
    }
}

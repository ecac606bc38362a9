use std::fmt;

use crate::domain::{Game, GameStatus};

/// The one move the local player may attempt against the current snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LegalAction {
    None,
    PlaceTrap,
    SelectSeat,
}

impl fmt::Display for LegalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegalAction::None => f.write_str("no action"),
            LegalAction::PlaceTrap => f.write_str("place trap"),
            LegalAction::SelectSeat => f.write_str("select seat"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusMessage {
    PlaceYourTrap,
    ChooseASeat,
    OpponentsTurn,
    WaitingForOpponent,
    Victory,
    Defeat,
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusMessage::PlaceYourTrap => "place your trap",
            StatusMessage::ChooseASeat => "choose a seat",
            StatusMessage::OpponentsTurn => "opponent's turn",
            StatusMessage::WaitingForOpponent => "waiting for opponent",
            StatusMessage::Victory => "you win!",
            StatusMessage::Defeat => "you lose...",
        };
        f.write_str(text)
    }
}

/// Advisory classification of a snapshot from one player's point of view.
///
/// The service validates every move again; this only keeps the client from
/// sending moves it already knows are out of turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnView {
    pub is_my_turn: bool,
    pub legal_action: LegalAction,
    pub message: StatusMessage,
}

impl TurnView {
    pub fn allows(&self, action: LegalAction) -> bool {
        action != LegalAction::None && self.legal_action == action
    }
}

pub fn classify(game: &Game, local_player: &str) -> TurnView {
    let is_my_turn = game.is_turn_of(local_player);

    let (legal_action, message) = match (game.status, is_my_turn) {
        (GameStatus::Finished, _) => {
            let won = game
                .winner
                .as_ref()
                .is_some_and(|winner| winner.id == local_player);
            let message = if won {
                StatusMessage::Victory
            } else {
                StatusMessage::Defeat
            };
            (LegalAction::None, message)
        }
        (_, false) => (LegalAction::None, StatusMessage::OpponentsTurn),
        (GameStatus::SettingTrap, true) => (LegalAction::PlaceTrap, StatusMessage::PlaceYourTrap),
        (GameStatus::InProgress, true) => (LegalAction::SelectSeat, StatusMessage::ChooseASeat),
        (GameStatus::Waiting, true) => (LegalAction::None, StatusMessage::WaitingForOpponent),
    };

    TurnView {
        is_my_turn,
        legal_action,
        message,
    }
}

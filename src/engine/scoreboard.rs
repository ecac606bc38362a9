use crate::domain::Game;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerRole {
    /// Player 1, moves first.
    First,
    Second,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreLine {
    pub score: i64,
    pub failures: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scoreboard {
    pub role: PlayerRole,
    pub mine: ScoreLine,
    pub opponent: ScoreLine,
}

/// Missing score lines read as zero.
pub fn scoreboard(game: &Game, local_player: &str) -> Scoreboard {
    let role = if game.player1.id == local_player {
        PlayerRole::First
    } else {
        PlayerRole::Second
    };
    let line = |score: Option<&crate::domain::GameScore>| {
        score
            .map(|s| ScoreLine {
                score: s.score,
                failures: s.failures,
            })
            .unwrap_or_default()
    };

    Scoreboard {
        role,
        mine: line(game.score_of(local_player)),
        opponent: line(game.opponent_score_of(local_player)),
    }
}

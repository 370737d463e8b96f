use serde::{Deserialize, Serialize};
use shakmaty::{Color, Outcome};

/// Result of the game as reported on the wire (`winner` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
    Draw,
}

/// Game outcome derived from a position. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameOutcome {
    #[default]
    InProgress,
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameOutcome {
    pub fn is_over(self) -> bool {
        self != GameOutcome::InProgress
    }

    /// `None` while the game is still running
    pub fn winner(self) -> Option<Winner> {
        match self {
            GameOutcome::InProgress => None,
            GameOutcome::WhiteWins => Some(Winner::White),
            GameOutcome::BlackWins => Some(Winner::Black),
            GameOutcome::Draw => Some(Winner::Draw),
        }
    }

    /// PGN-style result string (`1-0`, `0-1`, `1/2-1/2`, `*`)
    pub fn result(self) -> &'static str {
        match self {
            GameOutcome::InProgress => "*",
            GameOutcome::WhiteWins => "1-0",
            GameOutcome::BlackWins => "0-1",
            GameOutcome::Draw => "1/2-1/2",
        }
    }
}

impl From<Option<Outcome>> for GameOutcome {
    fn from(outcome: Option<Outcome>) -> Self {
        match outcome {
            None => GameOutcome::InProgress,
            Some(Outcome::Decisive {
                winner: Color::White,
            }) => GameOutcome::WhiteWins,
            Some(Outcome::Decisive {
                winner: Color::Black,
            }) => GameOutcome::BlackWins,
            Some(Outcome::Draw) => GameOutcome::Draw,
        }
    }
}

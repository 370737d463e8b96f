use serde::{Deserialize, Serialize};
use shakmaty::Color;
use std::fmt;
use std::str::FromStr;

/// Side of the board a node or a move belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerColor::White => "white",
            PlayerColor::Black => "black",
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(PlayerColor::White),
            "black" | "b" => Ok(PlayerColor::Black),
            other => Err(format!("expected 'white' or 'black', got {other:?}")),
        }
    }
}

impl From<Color> for PlayerColor {
    fn from(color: Color) -> Self {
        match color {
            Color::White => PlayerColor::White,
            Color::Black => PlayerColor::Black,
        }
    }
}

impl From<PlayerColor> for Color {
    fn from(color: PlayerColor) -> Self {
        match color {
            PlayerColor::White => Color::White,
            PlayerColor::Black => Color::Black,
        }
    }
}

//! Move request parsing and the record of an applied move

use crate::error::{RulesError, RulesResult};
use serde::{Deserialize, Serialize};
use shakmaty::uci::UciMove;
use shakmaty::{Role, Square};

/// A move as requested by a player or a peer: two squares and an optional
/// promotion piece. Not yet checked against any position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSpec {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl MoveSpec {
    /// Parse algebraic square names (`"e2"`, `"e4"`) and an optional
    /// promotion letter (`"q"`, `"N"`, `"queen"`).
    pub fn parse(from: &str, to: &str, promotion: Option<&str>) -> RulesResult<Self> {
        Ok(Self {
            from: parse_square(from)?,
            to: parse_square(to)?,
            promotion: promotion
                .filter(|p| !p.trim().is_empty())
                .map(parse_promotion)
                .transpose()?,
        })
    }

    pub fn from_uci(uci: &str) -> RulesResult<Self> {
        let parsed: UciMove = uci.trim().parse().map_err(|_| RulesError::InvalidUci {
            uci: uci.to_string(),
        })?;
        match parsed {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => Ok(Self {
                from,
                to,
                promotion,
            }),
            _ => Err(RulesError::InvalidUci {
                uci: uci.to_string(),
            }),
        }
    }

    pub fn to_uci(self) -> UciMove {
        UciMove::Normal {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }

    pub(crate) fn illegal(self) -> RulesError {
        RulesError::IllegalMove {
            from: self.from.to_string(),
            to: self.to.to_string(),
        }
    }
}

fn parse_square(name: &str) -> RulesResult<Square> {
    name.trim()
        .to_ascii_lowercase()
        .parse::<Square>()
        .map_err(|_| RulesError::InvalidSquare {
            square: name.to_string(),
        })
}

fn parse_promotion(piece: &str) -> RulesResult<Role> {
    let invalid = || RulesError::InvalidPromotion {
        piece: piece.to_string(),
    };
    let role = match piece.trim().to_ascii_lowercase().as_str() {
        "q" | "queen" => Role::Queen,
        "r" | "rook" => Role::Rook,
        "b" | "bishop" => Role::Bishop,
        "n" | "knight" => Role::Knight,
        _ => return Err(invalid()),
    };
    Ok(role)
}

/// Record of a move that was applied to a [`crate::GameBoard`].
///
/// `piece` is the moving piece's FEN letter (uppercase for white) and `san`
/// is computed against the position before the move, check suffix included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMove {
    pub from: String,
    pub to: String,
    pub piece: Option<String>,
    pub san: String,
    pub uci: String,
}

//! The node's single position and its move history
//!
//! [`GameBoard`] is a plain value. It is only ever mutated through
//! [`GameBoard::apply`] / [`GameBoard::apply_uci`], which resolve the request
//! against the legal move set first, so a failed call never changes anything.

use crate::color::PlayerColor;
use crate::error::{RulesError, RulesResult};
use crate::moves::{AppliedMove, MoveSpec};
use crate::outcome::GameOutcome;
use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position, Role};
use std::collections::BTreeMap;

/// Occupied square name → FEN piece letter (`"e1" → 'K'`)
pub type BoardState = BTreeMap<String, char>;

/// One entry of the legal move listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalMoveInfo {
    pub from: String,
    pub to: String,
    pub san: String,
}

#[derive(Debug, Clone, Default)]
pub struct GameBoard {
    position: Chess,
    history: Vec<UciMove>,
}

impl GameBoard {
    /// Standard starting position
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary FEN. History starts empty.
    pub fn from_fen(fen: &str) -> RulesResult<Self> {
        let invalid = |reason: String| RulesError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.parse().map_err(|e| invalid(format!("{e}")))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;
        Ok(Self {
            position,
            history: Vec::new(),
        })
    }

    /// Replay UCI moves from the starting position.
    ///
    /// Either every move is legal and a new board is returned, or the first
    /// offending move is reported.
    pub fn from_uci_moves<S: AsRef<str>>(moves: &[S]) -> RulesResult<Self> {
        let mut board = Self::new();
        for uci in moves {
            let spec = MoveSpec::from_uci(uci.as_ref())?;
            board.apply(&spec)?;
        }
        Ok(board)
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn side_to_move(&self) -> PlayerColor {
        self.position.turn().into()
    }

    /// Number of half-moves applied since this board was created
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    pub fn history_uci(&self) -> Vec<String> {
        self.history.iter().map(|m| m.to_string()).collect()
    }

    pub fn is_game_over(&self) -> bool {
        self.position.is_game_over()
    }

    pub fn outcome(&self) -> GameOutcome {
        self.position.outcome().into()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn board_state(&self) -> BoardState {
        let board = self.position.board();
        board
            .occupied()
            .into_iter()
            .filter_map(|sq| board.piece_at(sq).map(|p| (sq.to_string(), p.char())))
            .collect()
    }

    pub fn legal_moves(&self) -> Vec<LegalMoveInfo> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(|m| {
                let (from, to) = endpoints(m)?;
                Some(LegalMoveInfo {
                    from,
                    to,
                    san: San::from_move(&self.position, m).to_string(),
                })
            })
            .collect()
    }

    /// Find the legal move matching `spec`.
    ///
    /// A pawn reaching the last rank without an explicit promotion piece is
    /// promoted to a queen.
    pub fn resolve(&self, spec: &MoveSpec) -> RulesResult<Move> {
        if self.is_game_over() {
            return Err(RulesError::GameOver);
        }
        match spec.to_uci().to_move(&self.position) {
            Ok(m) => Ok(m),
            Err(_) if spec.promotion.is_none() => UciMove::Normal {
                from: spec.from,
                to: spec.to,
                promotion: Some(Role::Queen),
            }
            .to_move(&self.position)
            .map_err(|_| spec.illegal()),
            Err(_) => Err(spec.illegal()),
        }
    }

    /// Validate and apply. On error the board is unchanged.
    pub fn apply(&mut self, spec: &MoveSpec) -> RulesResult<AppliedMove> {
        let m = self.resolve(spec)?;
        Ok(self.push(&m))
    }

    /// Validate and apply a move in UCI form (as returned by an engine)
    pub fn apply_uci(&mut self, uci: &UciMove) -> RulesResult<AppliedMove> {
        if self.is_game_over() {
            return Err(RulesError::GameOver);
        }
        let m = uci.to_move(&self.position).map_err(|_| match uci {
            UciMove::Normal { from, to, .. } => RulesError::IllegalMove {
                from: from.to_string(),
                to: to.to_string(),
            },
            other => RulesError::InvalidUci {
                uci: other.to_string(),
            },
        })?;
        Ok(self.push(&m))
    }

    fn push(&mut self, m: &Move) -> AppliedMove {
        let (from, to) = endpoints(m).unwrap_or_default();
        let piece = m
            .from()
            .and_then(|sq| self.position.board().piece_at(sq))
            .map(|p| p.char().to_string());
        let uci = m.to_uci(CastlingMode::Standard);
        let san = SanPlus::from_move_and_play_unchecked(&mut self.position, m);
        self.history.push(uci.clone());
        AppliedMove {
            from,
            to,
            piece,
            san: san.to_string(),
            uci: uci.to_string(),
        }
    }
}

/// Origin and destination in standard (king moves two squares) notation
fn endpoints(m: &Move) -> Option<(String, String)> {
    match m.to_uci(CastlingMode::Standard) {
        UciMove::Normal { from, to, .. } => Some((from.to_string(), to.to_string())),
        _ => None,
    }
}

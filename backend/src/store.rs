//! Position store
//!
//! The node's one and only board plus the lifecycle flag. The store itself does
//! not lock; [`crate::node::Node`] keeps it behind the move lock and every
//! method here assumes the caller holds it.
//!
//! `generation` increases on every mutation (move, reset, resync). A caller
//! that released the lock to search can compare generations to find out
//! whether the position it searched is still the current one.

use crate::turn::Lifecycle;
use chess_logic_shared::shakmaty::uci::UciMove;
use chess_logic_shared::shakmaty::Chess;
use chess_logic_shared::{AppliedMove, GameBoard, MoveSpec, RulesResult};
use shared::protocol::{GameCommand, GamePhase};

#[derive(Debug, Default)]
pub struct PositionStore {
    board: GameBoard,
    lifecycle: Lifecycle,
    generation: u64,
}

/// Copy of the position taken before releasing the lock for a search
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    pub position: Chess,
    pub generation: u64,
    pub ply: usize,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &GameBoard {
        &self.board
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> GamePhase {
        self.lifecycle.phase(self.board.is_game_over())
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            position: self.board.position().clone(),
            generation: self.generation,
            ply: self.board.ply(),
        }
    }

    /// Apply a requested move. Nothing changes on error.
    pub fn apply(&mut self, spec: &MoveSpec) -> RulesResult<AppliedMove> {
        let applied = self.board.apply(spec)?;
        self.committed();
        Ok(applied)
    }

    /// Apply an engine move. Nothing changes on error.
    pub fn apply_uci(&mut self, uci: &UciMove) -> RulesResult<AppliedMove> {
        let applied = self.board.apply_uci(uci)?;
        self.committed();
        Ok(applied)
    }

    /// Replace the position wholesale with the starting position
    pub fn reset(&mut self) {
        self.replace(GameBoard::new());
    }

    pub fn replace(&mut self, board: GameBoard) {
        self.board = board;
        self.generation += 1;
    }

    /// Leave `NotStarted` without touching the board
    pub fn start(&mut self) {
        self.lifecycle = self.lifecycle.after_move();
    }

    /// Lifecycle command. `reset` also replaces the board.
    pub fn command(&mut self, command: GameCommand) {
        if command == GameCommand::Reset {
            self.reset();
        }
        self.lifecycle = self.lifecycle.apply_command(command);
    }

    fn committed(&mut self) {
        self.generation += 1;
        self.lifecycle = self.lifecycle.after_move();
    }
}

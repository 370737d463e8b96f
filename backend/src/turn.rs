//! Turn arbiter and game lifecycle
//!
//! The arbiter answers one question: may this node move on its own right now?
//! It is a pure function of the node's color, the side to move, whether the
//! node relays to a peer, and whether the game is over. It holds no state, so
//! it has to be asked again (under the move lock) after every applied move.

use chess_logic_shared::PlayerColor;
use shared::protocol::{GameCommand, GamePhase};

/// Whether a node may start an autonomous (engine) move.
///
/// Outside relay mode the node only ever reacts to explicit requests.
pub fn authorizes_auto_move(
    color: PlayerColor,
    side_to_move: PlayerColor,
    relay_mode: bool,
    game_over: bool,
) -> bool {
    relay_mode && side_to_move == color && !game_over
}

/// Arbiter bound to a node's fixed identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnArbiter {
    pub color: PlayerColor,
    pub relay_mode: bool,
}

impl TurnArbiter {
    pub fn new(color: PlayerColor, relay_mode: bool) -> Self {
        Self { color, relay_mode }
    }

    pub fn is_my_turn(&self, side_to_move: PlayerColor) -> bool {
        side_to_move == self.color
    }

    pub fn authorizes(&self, side_to_move: PlayerColor, game_over: bool) -> bool {
        authorizes_auto_move(self.color, side_to_move, self.relay_mode, game_over)
    }

    /// `is_my_turn` as reported by `/status`: `None` outside relay mode
    pub fn report(&self, side_to_move: PlayerColor) -> Option<bool> {
        self.relay_mode.then(|| self.is_my_turn(side_to_move))
    }
}

/// Stored part of the lifecycle. `Finished` is never stored, it is derived
/// from the position whenever the phase is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    NotStarted,
    Active,
    Paused,
}

impl Lifecycle {
    pub fn phase(self, game_over: bool) -> GamePhase {
        if game_over {
            return GamePhase::Finished;
        }
        match self {
            Lifecycle::NotStarted => GamePhase::NotStarted,
            Lifecycle::Active => GamePhase::Active,
            Lifecycle::Paused => GamePhase::Paused,
        }
    }

    /// New autonomous moves only start while active
    pub fn allows_auto_move(self) -> bool {
        self == Lifecycle::Active
    }

    pub fn apply_command(self, command: GameCommand) -> Lifecycle {
        match command {
            GameCommand::Reset | GameCommand::Resume => Lifecycle::Active,
            GameCommand::Pause => Lifecycle::Paused,
        }
    }

    /// The first applied move starts the game. A paused game stays paused.
    pub fn after_move(self) -> Lifecycle {
        match self {
            Lifecycle::NotStarted => Lifecycle::Active,
            other => other,
        }
    }
}

//! Shared chess logic and validation
//!
//! Thin layer over [`shakmaty`] used by every node. The rules library owns the
//! position; this crate only adds the pieces the relay protocol needs:
//!
//! - [`GameBoard`] - the single mutable position plus its move history
//! - [`MoveSpec`] - a requested move parsed from algebraic square names
//! - [`AppliedMove`] - what actually happened, ready to serialize or relay
//! - [`PlayerColor`] / [`GameOutcome`] / [`Winner`] - wire-friendly enums
//!
//! Nothing here locks. Callers serialize access themselves.

pub mod board;
pub mod color;
pub mod error;
pub mod moves;
pub mod outcome;

pub use board::{BoardState, GameBoard, LegalMoveInfo};
pub use color::PlayerColor;
pub use error::{RulesError, RulesResult};
pub use moves::{AppliedMove, MoveSpec};
pub use outcome::{GameOutcome, Winner};

pub use shakmaty;

//! Error types for rules validation
//!
//! Every failure here means the position was left untouched.

/// Errors raised while parsing or applying moves
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// Square name is not algebraic (`a1`..`h8`)
    #[error("Invalid square: {square:?}")]
    InvalidSquare { square: String },

    /// Promotion piece is not one of q, r, b, n
    #[error("Invalid promotion piece: {piece:?}")]
    InvalidPromotion { piece: String },

    /// Move is well-formed but not in the legal move set
    #[error("Illegal move: {from} to {to}")]
    IllegalMove { from: String, to: String },

    /// UCI string could not be parsed
    #[error("Invalid UCI move: {uci:?}")]
    InvalidUci { uci: String },

    /// FEN string could not be turned into a position
    #[error("Invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },

    /// Position is terminal, no further moves accepted
    #[error("Game is over")]
    GameOver,
}

/// Result type alias for rules operations
pub type RulesResult<T> = Result<T, RulesError>;

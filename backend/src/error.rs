//! Error types for the node
//!
//! Every variant that can come out of a mutating operation guarantees the
//! position was left as it was. [`IntoResponse`] maps them onto HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chess_logic_shared::RulesError;
use shared::protocol::{ErrorResponse, ResponseStatus};
use stockfish_ai::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Malformed body, missing or unparsable squares
    #[error("{message}")]
    InvalidMoveRequest { message: String },

    /// Well-formed move that is not legal in the current position
    #[error("Invalid move: {from} to {to}")]
    IllegalMove { from: String, to: String },

    /// Position is terminal
    #[error("Game is over")]
    GameAlreadyOver,

    /// No engine process, or it died
    #[error("Chess engine not available: {reason}")]
    EngineUnavailable { reason: String },

    /// Engine answered with a move the rules library rejects
    #[error("Engine returned illegal move {uci}")]
    EngineIllegalMove { uci: String },

    /// Engine is alive but the search failed
    #[error("Engine error: {0}")]
    Engine(#[source] EngineError),

    /// Relay endpoint hit on a node without a peer
    #[error("Not in PI vs PI mode")]
    NotRelayMode,

    /// Relayed move was computed against a different ply than ours
    #[error("Stale relay: expected ply {expected}, received ply {received}")]
    StaleRelay { expected: usize, received: usize },

    /// Position moved on while the engine was searching
    #[error("Position changed during engine search")]
    PositionChanged,

    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },
}

impl NodeError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        NodeError::InvalidMoveRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            NodeError::InvalidMoveRequest { .. }
            | NodeError::IllegalMove { .. }
            | NodeError::GameAlreadyOver
            | NodeError::NotRelayMode
            | NodeError::UnknownCommand { .. } => StatusCode::BAD_REQUEST,
            NodeError::StaleRelay { .. } | NodeError::PositionChanged => StatusCode::CONFLICT,
            NodeError::EngineUnavailable { .. }
            | NodeError::EngineIllegalMove { .. }
            | NodeError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Errors answering a move submission carry `move_accepted: false`
    fn is_move_rejection(&self) -> bool {
        matches!(
            self,
            NodeError::InvalidMoveRequest { .. }
                | NodeError::IllegalMove { .. }
                | NodeError::GameAlreadyOver
                | NodeError::StaleRelay { .. }
                | NodeError::NotRelayMode
        )
    }
}

impl From<RulesError> for NodeError {
    fn from(err: RulesError) -> Self {
        match err {
            RulesError::IllegalMove { from, to } => NodeError::IllegalMove { from, to },
            RulesError::GameOver => NodeError::GameAlreadyOver,
            other => NodeError::InvalidMoveRequest {
                message: other.to_string(),
            },
        }
    }
}

impl From<EngineError> for NodeError {
    fn from(err: EngineError) -> Self {
        if err.is_fatal() {
            NodeError::EngineUnavailable {
                reason: err.to_string(),
            }
        } else {
            NodeError::Engine(err)
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status: ResponseStatus::Error,
            message: self.to_string(),
            move_accepted: self.is_move_rejection().then_some(false),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type alias for node operations
pub type NodeResult<T> = Result<T, NodeError>;

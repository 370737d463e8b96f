use chess_logic_shared::{AppliedMove, BoardState, LegalMoveInfo, PlayerColor, Winner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `status` field carried by every response body
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
    Running,
}

/// Lifecycle of the game on one node as reported by `/status`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    NotStarted,
    Active,
    Paused,
    Finished,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `/move` (local player) and `/receive-opponent-move` (peer relay).
///
/// Every field is optional at the JSON level so that a missing square is
/// reported as a bad request by the handler instead of a decoder error.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MoveRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    pub piece: Option<String>,
    pub san: Option<String>,
    pub promotion: Option<String>,
    /// Sender's ply count before this move (relay only)
    pub ply: Option<usize>,
}

/// Outbound relay message sent by the node that just moved
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RelayedMove {
    pub from: String,
    pub to: String,
    pub piece: Option<String>,
    pub san: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    pub ply: usize,
    pub board_state: BoardState,
}

impl RelayedMove {
    /// Build the relay message for a move that was applied at `ply_before`
    pub fn from_applied(applied: &AppliedMove, ply_before: usize, board_state: BoardState) -> Self {
        // uci is from+to plus an optional promotion letter
        let promotion = applied.uci.get(4..).filter(|p| !p.is_empty()).map(str::to_string);
        Self {
            from: applied.from.clone(),
            to: applied.to.clone(),
            piece: applied.piece.clone(),
            san: applied.san.clone(),
            promotion,
            ply: ply_before,
            board_state,
        }
    }
}

/// Body of `/game-control`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct ControlRequest {
    pub command: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameCommand {
    Reset,
    Pause,
    Resume,
}

impl FromStr for GameCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reset" => Ok(GameCommand::Reset),
            "pause" => Ok(GameCommand::Pause),
            "resume" => Ok(GameCommand::Resume),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for GameCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameCommand::Reset => "reset",
            GameCommand::Pause => "pause",
            GameCommand::Resume => "resume",
        })
    }
}

/// Body of `/set-bot-difficulty`. Out-of-range values are clamped server side.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct DifficultyRequest {
    pub elo: Option<i64>,
    pub skill: Option<i64>,
}

/// Body of `/engine-config`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct EngineConfigRequest {
    pub skill_level: Option<i64>,
    pub elo_rating: Option<i64>,
}

/// Body of `/sync-board`: the full game in UCI notation from the start
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct SyncBoardRequest {
    pub moves: Vec<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MoveResponse {
    pub status: ResponseStatus,
    pub move_accepted: bool,
    pub board_state: BoardState,
    pub game_over: bool,
    pub winner: Option<Winner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_player: Option<PlayerColor>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EngineMoveResponse {
    pub status: ResponseStatus,
    pub engine_move: AppliedMove,
    pub board_state: BoardState,
    pub game_over: bool,
    pub winner: Option<Winner>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusResponse {
    pub status: ResponseStatus,
    pub engine_connected: bool,
    pub game_active: bool,
    pub game_phase: GamePhase,
    pub current_player: PlayerColor,
    pub board_fen: String,
    pub relay_mode: bool,
    pub color: PlayerColor,
    pub opponent_address: Option<String>,
    /// `null` outside relay mode
    pub is_my_turn: Option<bool>,
    pub ply: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BoardStateResponse {
    pub status: ResponseStatus,
    pub board_state: BoardState,
    pub current_player: PlayerColor,
    pub game_over: bool,
    pub board_fen: String,
    pub moves: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DebugResponse {
    pub board_fen: String,
    pub legal_moves: Vec<LegalMoveInfo>,
    pub turn: PlayerColor,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ControlResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub game_phase: GamePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_state: Option<BoardState>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DifficultyResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub elo: u32,
    pub skill: u8,
    pub board_state: BoardState,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EngineConfigResponse {
    pub status: ResponseStatus,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SyncBoardResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub board_state: BoardState,
    pub board_fen: String,
    pub ply: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_accepted: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_request_missing_fields_default_to_none() {
        let request: MoveRequest = serde_json::from_str(r#"{"from": "e2"}"#).unwrap();
        assert_eq!(request.from.as_deref(), Some("e2"));
        assert!(request.to.is_none());
        assert!(request.ply.is_none());
    }

    #[test]
    fn test_relayed_move_is_readable_as_move_request() {
        let applied = AppliedMove {
            from: "e2".to_string(),
            to: "e4".to_string(),
            piece: Some("P".to_string()),
            san: "e4".to_string(),
            uci: "e2e4".to_string(),
        };
        let relayed = RelayedMove::from_applied(&applied, 0, BoardState::new());
        assert_eq!(relayed.promotion, None);

        let json = serde_json::to_string(&relayed).unwrap();
        let request: MoveRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.from.as_deref(), Some("e2"));
        assert_eq!(request.to.as_deref(), Some("e4"));
        assert_eq!(request.san.as_deref(), Some("e4"));
        assert_eq!(request.ply, Some(0));
    }

    #[test]
    fn test_relayed_promotion_letter() {
        let applied = AppliedMove {
            from: "a7".to_string(),
            to: "a8".to_string(),
            piece: Some("P".to_string()),
            san: "a8=N".to_string(),
            uci: "a7a8n".to_string(),
        };
        let relayed = RelayedMove::from_applied(&applied, 40, BoardState::new());
        assert_eq!(relayed.promotion.as_deref(), Some("n"));
        assert_eq!(relayed.ply, 40);
    }

    #[test]
    fn test_game_command_parsing() {
        assert_eq!("reset".parse::<GameCommand>(), Ok(GameCommand::Reset));
        assert_eq!("pause".parse::<GameCommand>(), Ok(GameCommand::Pause));
        assert_eq!("resume".parse::<GameCommand>(), Ok(GameCommand::Resume));
        assert_eq!(
            "new_game".parse::<GameCommand>(),
            Err("new_game".to_string())
        );
    }

    #[test]
    fn test_move_response_winner_serializes_null() {
        let response = MoveResponse {
            status: ResponseStatus::Success,
            move_accepted: true,
            board_state: BoardState::new(),
            game_over: false,
            winner: None,
            current_player: None,
        };
        let value: serde_json::Value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "success");
        assert!(value["winner"].is_null());
        assert!(value.get("current_player").is_none());
    }

    #[test]
    fn test_game_phase_snake_case() {
        let json = serde_json::to_string(&GamePhase::NotStarted).unwrap();
        assert_eq!(json, "\"not_started\"");
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            status: ResponseStatus::Error,
            message: "Invalid move".to_string(),
            move_accepted: Some(false),
        };
        let value: serde_json::Value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["move_accepted"], false);
    }
}

use crate::error::{NodeError, NodeResult};
use crate::node::{MoveOutcome, Node};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use shared::protocol::{
    BoardStateResponse, ControlRequest, ControlResponse, DebugResponse, DifficultyRequest,
    DifficultyResponse, EngineConfigRequest, EngineConfigResponse, EngineMoveResponse,
    GameCommand, MoveRequest, MoveResponse, ResponseStatus, StatusResponse, SyncBoardRequest,
    SyncBoardResponse,
};
use std::sync::Arc;
use stockfish_ai::options::{DEFAULT_ELO, DEFAULT_SKILL};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub node: Arc<Node>,
}

/// Routes are served at the root and again under `/api`
pub fn router(node: Arc<Node>) -> Router {
    let state = AppState { node };
    let routes = Router::new()
        .route("/status", get(status))
        .route("/move", post(submit_move))
        .route("/receive-opponent-move", post(receive_opponent_move))
        .route("/engine-move", post(engine_move))
        .route("/game-control", post(game_control))
        .route("/set-bot-difficulty", post(set_bot_difficulty))
        .route("/engine-config", post(engine_config))
        .route("/board-state", get(board_state))
        .route("/debug", get(debug_info))
        .route("/sync-board", post(sync_board));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .with_state(state)
}

/// Body extractor result mapped onto the node's error taxonomy
fn body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> NodeResult<T> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        warn!("[API] Rejected body: {}", rejection.body_text());
        NodeError::bad_request(format!("Invalid JSON: {}", rejection.body_text()))
    })
}

fn move_response(outcome: MoveOutcome, current_player: bool) -> MoveResponse {
    MoveResponse {
        status: ResponseStatus::Success,
        move_accepted: true,
        board_state: outcome.board_state,
        game_over: outcome.game_over,
        winner: outcome.winner,
        current_player: current_player.then_some(outcome.side_to_move),
    }
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.node.status().await)
}

async fn submit_move(
    State(state): State<AppState>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> NodeResult<Json<MoveResponse>> {
    let request = body(payload)?;
    let outcome = state.node.submit_local_move(&request).await?;
    Ok(Json(move_response(outcome, true)))
}

async fn receive_opponent_move(
    State(state): State<AppState>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> NodeResult<Json<MoveResponse>> {
    let request = body(payload)?;
    let outcome = state.node.receive_opponent_move(&request).await?;
    Ok(Json(move_response(outcome, false)))
}

async fn engine_move(State(state): State<AppState>) -> NodeResult<Json<EngineMoveResponse>> {
    let outcome = state.node.engine_move().await?;
    Ok(Json(EngineMoveResponse {
        status: ResponseStatus::Success,
        engine_move: outcome.applied,
        board_state: outcome.board_state,
        game_over: outcome.game_over,
        winner: outcome.winner,
    }))
}

async fn game_control(
    State(state): State<AppState>,
    payload: Result<Json<ControlRequest>, JsonRejection>,
) -> NodeResult<Json<ControlResponse>> {
    let request = body(payload)?;
    let command = request.command.unwrap_or_default();
    let command: GameCommand = command
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|command| NodeError::UnknownCommand { command })?;

    let outcome = state.node.control(command).await;
    Ok(Json(ControlResponse {
        status: ResponseStatus::Success,
        message: outcome.message,
        game_phase: outcome.phase,
        board_state: outcome.board_state,
    }))
}

async fn set_bot_difficulty(
    State(state): State<AppState>,
    payload: Result<Json<DifficultyRequest>, JsonRejection>,
) -> NodeResult<Json<DifficultyResponse>> {
    let request = body(payload)?;
    let elo = request.elo.unwrap_or(i64::from(DEFAULT_ELO));
    let skill = request.skill.unwrap_or(i64::from(DEFAULT_SKILL));

    let (options, board_state) = state.node.set_difficulty(elo, skill).await?;
    Ok(Json(DifficultyResponse {
        status: ResponseStatus::Success,
        message: format!(
            "Bot difficulty set to ELO {}, Skill Level {}",
            options.elo, options.skill
        ),
        elo: options.elo,
        skill: options.skill,
        board_state,
    }))
}

async fn engine_config(
    State(state): State<AppState>,
    payload: Result<Json<EngineConfigRequest>, JsonRejection>,
) -> NodeResult<Json<EngineConfigResponse>> {
    let request = body(payload)?;
    let elo = request.elo_rating.unwrap_or(i64::from(DEFAULT_ELO));
    let skill = request.skill_level.unwrap_or(i64::from(DEFAULT_SKILL));

    let options = state.node.configure_engine(elo, skill).await?;
    Ok(Json(EngineConfigResponse {
        status: ResponseStatus::Success,
        message: format!(
            "Engine configured: Skill Level {}, ELO {}",
            options.skill, options.elo
        ),
    }))
}

async fn board_state(State(state): State<AppState>) -> Json<BoardStateResponse> {
    Json(state.node.board_state().await)
}

async fn debug_info(State(state): State<AppState>) -> Json<DebugResponse> {
    Json(state.node.debug_info().await)
}

async fn sync_board(
    State(state): State<AppState>,
    payload: Result<Json<SyncBoardRequest>, JsonRejection>,
) -> NodeResult<Json<SyncBoardResponse>> {
    let request = body(payload)?;
    let outcome = state.node.sync_board(&request.moves).await?;
    info!("[API] sync-board applied {} moves", outcome.ply);
    Ok(Json(SyncBoardResponse {
        status: ResponseStatus::Success,
        message: format!("Board synced with {} moves", outcome.ply),
        board_state: outcome.board_state,
        board_fen: outcome.board_fen,
        ply: outcome.ply,
    }))
}

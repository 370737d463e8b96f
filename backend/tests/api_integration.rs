//! Backend API Integration Tests
//!
//! Tests for the Axum HTTP endpoints using Router::oneshot pattern.

mod common;

use axum::{http::StatusCode, Router};
use backend::api;
use chess_logic_shared::PlayerColor;
use common::{send, solo_node, ScriptedEngine};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn test_router() -> Router {
    api::router(solo_node(None))
}

#[tokio::test]
async fn test_move_e2e4_is_accepted() {
    let app = test_router();

    let (status, body) = send(&app, "POST", "/move", Some(json!({"from": "e2", "to": "e4"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["move_accepted"], true);
    assert_eq!(body["board_state"]["e4"], "P");
    assert!(body["board_state"].get("e2").is_none());
    assert_eq!(body["current_player"], "black");
    assert_eq!(body["game_over"], false);
}

#[tokio::test]
async fn test_illegal_move_leaves_board_unchanged() {
    let app = test_router();

    let (status, body) = send(&app, "POST", "/api/move", Some(json!({"from": "e2", "to": "e5"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["move_accepted"], false);
    assert_eq!(body["message"], "Invalid move: e2 to e5");

    let (_, board) = send(&app, "GET", "/board-state", None).await;
    assert_eq!(board["board_state"]["e2"], "P");
    assert_eq!(board["current_player"], "white");
    assert_eq!(board["moves"], json!([]));
}

#[tokio::test]
async fn test_malformed_requests_are_rejected() {
    let app = test_router();

    let (status, body) = send(&app, "POST", "/move", Some(json!({"from": "e2"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["move_accepted"], false);

    let (status, _) = send(&app, "POST", "/move", Some(json!({"from": "e2", "to": "k9"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/move", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_status_shape_outside_relay_mode() {
    let app = test_router();

    for uri in ["/status", "/api/status"] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["engine_connected"], false);
        assert_eq!(body["game_phase"], "not_started");
        assert_eq!(body["current_player"], "white");
        assert_eq!(body["relay_mode"], false);
        assert_eq!(body["color"], "white");
        assert!(body["opponent_address"].is_null());
        assert!(body["is_my_turn"].is_null());
        assert_eq!(body["ply"], 0);
    }
}

#[tokio::test]
async fn test_relay_endpoint_outside_relay_mode() {
    let app = test_router();

    let (status, body) = send(
        &app,
        "POST",
        "/api/receive-opponent-move",
        Some(json!({"from": "e2", "to": "e4"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Not in PI vs PI mode");
}

#[tokio::test]
async fn test_game_control_commands() {
    let app = test_router();
    send(&app, "POST", "/move", Some(json!({"from": "e2", "to": "e4"}))).await;

    let (status, body) = send(&app, "POST", "/game-control", Some(json!({"command": "pause"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game_phase"], "paused");
    assert!(body.get("board_state").is_none());

    let (_, body) = send(&app, "POST", "/game-control", Some(json!({"command": "resume"}))).await;
    assert_eq!(body["game_phase"], "active");

    let (_, body) = send(&app, "POST", "/game-control", Some(json!({"command": "reset"}))).await;
    assert_eq!(body["message"], "Game reset to starting position");
    assert_eq!(body["board_state"]["e2"], "P");

    let (_, status_body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status_body["ply"], 0);
    assert_eq!(status_body["game_active"], true);
}

#[tokio::test]
async fn test_unknown_command_changes_nothing() {
    let app = test_router();

    let (status, body) = send(&app, "POST", "/game-control", Some(json!({"command": "explode"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unknown command: explode");

    let (status, _) = send(&app, "POST", "/game-control", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status_body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status_body["game_phase"], "not_started");
}

#[tokio::test]
async fn test_engine_routes_without_engine() {
    let app = test_router();

    let (status, body) = send(&app, "POST", "/engine-move", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Chess engine not available: not initialized");

    let (status, _) = send(&app, "POST", "/set-bot-difficulty", Some(json!({"elo": 1500, "skill": 5}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_engine_move_plays_for_side_to_move() {
    let engine = ScriptedEngine::first_legal();
    let searches = engine.counter();
    let app = api::router(solo_node(engine.boxed()));

    let (status, body) = send(&app, "POST", "/engine-move", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body["engine_move"]["san"].is_string());
    assert_eq!(searches.load(Ordering::SeqCst), 1);

    let (_, status_body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status_body["current_player"], "black");
    assert_eq!(status_body["ply"], 1);
}

#[tokio::test]
async fn test_engine_illegal_move_is_discarded() {
    let app = api::router(solo_node(ScriptedEngine::illegal().boxed()));

    let (status, body) = send(&app, "POST", "/engine-move", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Engine returned illegal move e1e8");

    let (_, status_body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status_body["ply"], 0);
}

#[tokio::test]
async fn test_finished_game_rejects_moves_without_search() {
    let engine = ScriptedEngine::first_legal();
    let searches = engine.counter();
    let app = api::router(solo_node(engine.boxed()));

    // Fool's mate
    let (status, body) = send(
        &app,
        "POST",
        "/sync-board",
        Some(json!({"moves": ["f2f3", "e7e5", "g2g4", "d8h4"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ply"], 4);

    let (status, body) = send(&app, "POST", "/engine-move", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Game is over");
    assert_eq!(searches.load(Ordering::SeqCst), 0);

    let (status, _) = send(&app, "POST", "/move", Some(json!({"from": "a2", "to": "a3"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status_body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status_body["game_phase"], "finished");
}

#[tokio::test]
async fn test_sync_board_rejects_bad_history() {
    let app = test_router();
    send(&app, "POST", "/move", Some(json!({"from": "d2", "to": "d4"}))).await;

    let (status, _) = send(&app, "POST", "/sync-board", Some(json!({"moves": ["e2e4", "e2e4"]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, board) = send(&app, "GET", "/board-state", None).await;
    assert_eq!(board["moves"], json!(["d2d4"]));
}

#[tokio::test]
async fn test_difficulty_is_clamped_and_resets_board() {
    let app = api::router(solo_node(ScriptedEngine::first_legal().boxed()));
    send(&app, "POST", "/move", Some(json!({"from": "e2", "to": "e4"}))).await;

    let (status, body) = send(&app, "POST", "/set-bot-difficulty", Some(json!({"elo": 9000, "skill": -3}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["elo"], 2850);
    assert_eq!(body["skill"], 0);
    assert_eq!(body["board_state"]["e2"], "P");

    let (status, body) = send(&app, "POST", "/engine-config", Some(json!({"skill_level": 15, "elo_rating": 1800}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Engine configured: Skill Level 15, ELO 1800");
}

#[tokio::test]
async fn test_debug_lists_legal_moves() {
    let app = test_router();

    let (status, body) = send(&app, "GET", "/api/debug", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["turn"], "white");
    assert_eq!(body["legal_moves"].as_array().map(Vec::len), Some(20));
}

#[tokio::test]
async fn test_search_result_dropped_when_position_moves() {
    let engine = ScriptedEngine::slow(Duration::from_millis(300));
    let node = solo_node(engine.boxed());

    let searching = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.engine_move().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let app = api::router(Arc::clone(&node));
    let (status, _) = send(&app, "POST", "/move", Some(json!({"from": "e2", "to": "e4"}))).await;
    assert_eq!(status, StatusCode::OK);

    let result = searching.await.unwrap();
    assert!(matches!(result, Err(backend::NodeError::PositionChanged)));

    let status = node.status().await;
    assert_eq!(status.ply, 1);
    assert_eq!(status.current_player, PlayerColor::Black);
}

//! A peer node: one game, one color, optionally one peer
//!
//! # Locking
//!
//! `store` is the move lock. Every read-modify-write of the position happens
//! with it held, so a local move and a relayed move arriving together are
//! applied one after the other and never interleave.
//!
//! `engine` has its own lock. The engine search runs on a snapshot with the
//! move lock released, so `/status` and inbound relays are never stuck behind
//! a search. The result is applied only if the store's generation is still the
//! one the snapshot was taken at; otherwise the move is dropped. Lock order is
//! always store first, then engine.
//!
//! # Auto-move
//!
//! After any applied move the arbiter is asked again (under the move lock). If
//! it now authorizes this node, [`Node::schedule_auto_move`] spawns a task
//! whose handle nobody awaits; its only visible effects are the new position
//! and the relay POST to the peer.

use crate::error::{NodeError, NodeResult};
use crate::relay::{RelayClient, RelayError};
use crate::store::{PositionStore, SearchSnapshot};
use crate::turn::TurnArbiter;
use chess_logic_shared::shakmaty::uci::UciMove;
use chess_logic_shared::{AppliedMove, BoardState, GameBoard, MoveSpec, PlayerColor, Winner};
use shared::protocol::{
    BoardStateResponse, DebugResponse, GameCommand, GamePhase, MoveRequest, RelayedMove,
    ResponseStatus, StatusResponse,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stockfish_ai::{EngineOptions, SearchEngine};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

/// Fixed at process start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub color: PlayerColor,
    /// `None` means single-player mode
    pub peer: Option<Url>,
}

impl NodeIdentity {
    pub fn relay_mode(&self) -> bool {
        self.peer.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSettings {
    /// Engine thinking time per move
    pub think_time: Duration,
    /// Upper bound for one relay POST
    pub relay_timeout: Duration,
    /// Delay before a white relay node plays its first move after startup
    pub start_delay: Duration,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            think_time: Duration::from_secs(2),
            relay_timeout: Duration::from_secs(10),
            start_delay: Duration::from_secs(2),
        }
    }
}

/// Result of an accepted move, read under the move lock
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub applied: AppliedMove,
    pub board_state: BoardState,
    pub game_over: bool,
    pub winner: Option<Winner>,
    pub side_to_move: PlayerColor,
    /// Whether an auto-move was scheduled as a consequence
    pub auto_move_scheduled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlOutcome {
    pub message: String,
    pub phase: GamePhase,
    pub board_state: Option<BoardState>,
    pub auto_move_scheduled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub board_state: BoardState,
    pub board_fen: String,
    pub ply: usize,
}

pub struct Node {
    identity: NodeIdentity,
    settings: NodeSettings,
    arbiter: TurnArbiter,
    store: Mutex<PositionStore>,
    engine: Mutex<Option<Box<dyn SearchEngine>>>,
    engine_connected: AtomicBool,
    relay: Option<RelayClient>,
}

impl Node {
    pub fn new(
        identity: NodeIdentity,
        settings: NodeSettings,
        engine: Option<Box<dyn SearchEngine>>,
    ) -> Result<Self, RelayError> {
        let relay = identity
            .peer
            .clone()
            .map(|peer| RelayClient::new(peer, settings.relay_timeout))
            .transpose()?;
        Ok(Self {
            arbiter: TurnArbiter::new(identity.color, identity.relay_mode()),
            identity,
            settings,
            store: Mutex::new(PositionStore::new()),
            engine_connected: AtomicBool::new(engine.is_some()),
            engine: Mutex::new(engine),
            relay,
        })
    }

    pub fn engine_connected(&self) -> bool {
        self.engine_connected.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------------

    /// Move submitted by the local player (`/move`)
    pub async fn submit_local_move(self: &Arc<Self>, request: &MoveRequest) -> NodeResult<MoveOutcome> {
        let spec = parse_request(request)?;
        info!(
            "[NODE] {} received local move {} -> {}",
            self.identity.color, spec.from, spec.to
        );

        let outcome = {
            let mut store = self.store.lock().await;
            let applied = store.apply(&spec)?;
            self.settle(&store, applied)
        };

        if outcome.auto_move_scheduled {
            self.schedule_auto_move();
        }
        Ok(outcome)
    }

    /// Move relayed by the peer (`/receive-opponent-move`)
    pub async fn receive_opponent_move(
        self: &Arc<Self>,
        request: &MoveRequest,
    ) -> NodeResult<MoveOutcome> {
        if !self.identity.relay_mode() {
            return Err(NodeError::NotRelayMode);
        }
        let spec = parse_request(request)?;
        info!(
            "[RELAY] {} received opponent move {} -> {}",
            self.identity.color, spec.from, spec.to
        );

        let outcome = {
            let mut store = self.store.lock().await;
            if let Some(received) = request.ply {
                let expected = store.board().ply();
                if received != expected {
                    warn!(
                        "[RELAY] Dropping stale move {} -> {} (ply {} != {})",
                        spec.from, spec.to, received, expected
                    );
                    return Err(NodeError::StaleRelay { expected, received });
                }
            }
            let applied = store.apply(&spec).inspect_err(|e| {
                warn!("[RELAY] {} rejected opponent move: {}", self.identity.color, e);
            })?;
            self.settle(&store, applied)
        };

        // The move is committed and the lock released before the reply search starts
        if outcome.auto_move_scheduled {
            info!("[RELAY] {} to move, scheduling reply", self.identity.color);
            self.schedule_auto_move();
        }
        Ok(outcome)
    }

    /// Build the outcome of a just-applied move and ask the arbiter again
    fn settle(&self, store: &PositionStore, applied: AppliedMove) -> MoveOutcome {
        let board = store.board();
        let outcome = board.outcome();
        let side_to_move = board.side_to_move();
        let due = store.lifecycle().allows_auto_move()
            && self.arbiter.authorizes(side_to_move, outcome.is_over());
        if outcome.is_over() {
            info!("[NODE] Game over: {}", outcome.result());
        }
        MoveOutcome {
            applied,
            board_state: board.board_state(),
            game_over: outcome.is_over(),
            winner: outcome.winner(),
            side_to_move,
            auto_move_scheduled: due,
        }
    }

    /// Fire-and-forget auto-move. The handle may be awaited by tests.
    pub fn schedule_auto_move(self: &Arc<Self>) -> JoinHandle<()> {
        let node = Arc::clone(self);
        tokio::spawn(async move {
            match node.auto_move().await {
                Ok(Some(applied)) => {
                    debug!("[NODE] auto-move {} finished", applied.san);
                }
                Ok(None) => {}
                Err(NodeError::PositionChanged) => {
                    debug!("[NODE] auto-move superseded by a newer position");
                }
                Err(e) => error!("[NODE] {} auto-move failed: {}", node.identity.color, e),
            }
        })
    }

    /// Compute, apply and relay one move if the arbiter allows it.
    ///
    /// Returns `Ok(None)` when it is not this node's turn, the game is over or
    /// the game is paused. A relay failure is logged and does not undo the move.
    pub async fn auto_move(&self) -> NodeResult<Option<AppliedMove>> {
        let snapshot = {
            let store = self.store.lock().await;
            let board = store.board();
            if !store.lifecycle().allows_auto_move() {
                debug!("[NODE] auto-move suppressed ({:?})", store.lifecycle());
                return Ok(None);
            }
            if !self
                .arbiter
                .authorizes(board.side_to_move(), board.is_game_over())
            {
                debug!("[NODE] auto-move not authorized");
                return Ok(None);
            }
            store.snapshot()
        };

        info!(
            "[NODE] {}: my turn at ply {}, asking engine",
            self.identity.color, snapshot.ply
        );
        // Our own move hands the turn over, so the arbiter cannot ask for another
        let (outcome, relayed) = self.search_and_apply(snapshot).await?;
        self.relay(&relayed).await;
        Ok(Some(outcome.applied))
    }

    /// Explicit engine move for the side to move (`/engine-move`).
    ///
    /// The move is relayed like any other. When it hands the turn to this
    /// node's color, an auto-move follows.
    pub async fn engine_move(self: &Arc<Self>) -> NodeResult<MoveOutcome> {
        if !self.engine_connected() {
            return Err(NodeError::EngineUnavailable {
                reason: "not initialized".to_string(),
            });
        }
        let snapshot = {
            let store = self.store.lock().await;
            if store.board().is_game_over() {
                return Err(NodeError::GameAlreadyOver);
            }
            store.snapshot()
        };

        let (outcome, relayed) = self.search_and_apply(snapshot).await?;
        self.relay(&relayed).await;
        if outcome.auto_move_scheduled {
            self.schedule_auto_move();
        }
        Ok(outcome)
    }

    /// Search, then apply under the move lock and ask the arbiter again
    async fn search_and_apply(
        &self,
        snapshot: SearchSnapshot,
    ) -> NodeResult<(MoveOutcome, RelayedMove)> {
        let uci = self.search(&snapshot).await?;

        let mut store = self.store.lock().await;
        if store.generation() != snapshot.generation {
            info!(
                "[NODE] Position changed during search, discarding {}",
                uci
            );
            return Err(NodeError::PositionChanged);
        }
        let applied = store.apply_uci(&uci).map_err(|e| {
            error!("[ENGINE] Engine tried illegal move {}: {}", uci, e);
            NodeError::EngineIllegalMove {
                uci: uci.to_string(),
            }
        })?;
        info!(
            "[NODE] {} played {} ({})",
            self.identity.color, applied.san, applied.uci
        );
        let relayed = RelayedMove::from_applied(&applied, snapshot.ply, store.board().board_state());
        Ok((self.settle(&store, applied), relayed))
    }

    async fn search(
        &self,
        snapshot: &SearchSnapshot,
    ) -> NodeResult<UciMove> {
        let mut guard = self.engine.lock().await;
        let Some(engine) = guard.as_mut() else {
            return Err(NodeError::EngineUnavailable {
                reason: "not initialized".to_string(),
            });
        };
        match engine
            .best_move(&snapshot.position, self.settings.think_time)
            .await
        {
            Ok(uci) => Ok(uci),
            Err(e) => {
                if e.is_fatal() {
                    error!("[ENGINE] Engine lost: {}", e);
                    self.engine_connected.store(false, Ordering::SeqCst);
                }
                Err(e.into())
            }
        }
    }

    /// Send to the peer. Failure is a warning; the local position stands.
    async fn relay(&self, relayed: &RelayedMove) -> bool {
        let Some(client) = &self.relay else {
            return false;
        };
        match client.send_move(relayed).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "[RELAY] Could not deliver {} to {}: {} (local position kept)",
                    relayed.san,
                    client.peer(),
                    e
                );
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub async fn control(self: &Arc<Self>, command: GameCommand) -> ControlOutcome {
        let outcome = {
            let mut store = self.store.lock().await;
            store.command(command);
            let board = store.board();
            let due = match command {
                GameCommand::Pause => false,
                GameCommand::Reset | GameCommand::Resume => self
                    .arbiter
                    .authorizes(board.side_to_move(), board.is_game_over()),
            };
            let message = match command {
                GameCommand::Reset => "Game reset to starting position",
                GameCommand::Pause => "Game paused",
                GameCommand::Resume => "Game resumed",
            };
            ControlOutcome {
                message: message.to_string(),
                phase: store.phase(),
                board_state: (command == GameCommand::Reset).then(|| board.board_state()),
                auto_move_scheduled: due,
            }
        };

        info!("[NODE] {} -> {:?}", command, outcome.phase);
        if outcome.auto_move_scheduled {
            self.schedule_auto_move();
        }
        outcome
    }

    /// Startup kick-off: a white relay node opens the game after `start_delay`
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.arbiter.authorizes(PlayerColor::White, false) {
            return None;
        }
        let node = Arc::clone(self);
        info!(
            "[NODE] {} will make the first move in {:?}",
            node.identity.color, node.settings.start_delay
        );
        Some(tokio::spawn(async move {
            tokio::time::sleep(node.settings.start_delay).await;
            {
                let mut store = node.store.lock().await;
                if store.board().ply() > 0 || store.board().is_game_over() {
                    return;
                }
                store.start();
            }
            if let Err(e) = node.schedule_auto_move().await {
                error!("[NODE] kick-off task failed: {}", e);
            }
        }))
    }

    /// Rebuild the position from a full move list. All or nothing.
    pub async fn sync_board(self: &Arc<Self>, moves: &[String]) -> NodeResult<SyncOutcome> {
        let board = GameBoard::from_uci_moves(moves)?;
        let (outcome, due) = {
            let mut store = self.store.lock().await;
            store.replace(board);
            let board = store.board();
            let due = store.lifecycle().allows_auto_move()
                && self
                    .arbiter
                    .authorizes(board.side_to_move(), board.is_game_over());
            (
                SyncOutcome {
                    board_state: board.board_state(),
                    board_fen: board.fen(),
                    ply: board.ply(),
                },
                due,
            )
        };
        info!("[NODE] Board synced to ply {}", outcome.ply);
        if due {
            self.schedule_auto_move();
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Engine settings
    // -----------------------------------------------------------------------

    /// Clamp, forward to the engine, then reset the board
    pub async fn set_difficulty(&self, elo: i64, skill: i64) -> NodeResult<(EngineOptions, BoardState)> {
        let options = EngineOptions::clamped(elo, skill);
        let mut store = self.store.lock().await;
        self.configure_locked(&options).await?;
        store.reset();
        info!(
            "[ENGINE] Bot difficulty set: ELO {}, Skill Level {}; board reset",
            options.elo, options.skill
        );
        Ok((options, store.board().board_state()))
    }

    /// Clamp and forward to the engine without touching the board
    pub async fn configure_engine(&self, elo: i64, skill: i64) -> NodeResult<EngineOptions> {
        let options = EngineOptions::clamped(elo, skill);
        self.configure_locked(&options).await?;
        info!(
            "[ENGINE] Engine configured: Skill Level {}, ELO {}",
            options.skill, options.elo
        );
        Ok(options)
    }

    async fn configure_locked(&self, options: &EngineOptions) -> NodeResult<()> {
        let mut guard = self.engine.lock().await;
        let Some(engine) = guard.as_mut() else {
            return Err(NodeError::EngineUnavailable {
                reason: "not initialized".to_string(),
            });
        };
        engine.configure(options).await.map_err(|e| {
            if e.is_fatal() {
                self.engine_connected.store(false, Ordering::SeqCst);
            }
            NodeError::from(e)
        })
    }

    pub async fn shutdown(&self) {
        let mut guard = self.engine.lock().await;
        if let Some(mut engine) = guard.take() {
            if let Err(e) = engine.shutdown().await {
                warn!("[ENGINE] shutdown failed: {}", e);
            }
            info!("[ENGINE] Chess engine closed");
        }
        self.engine_connected.store(false, Ordering::SeqCst);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn status(&self) -> StatusResponse {
        let store = self.store.lock().await;
        let board = store.board();
        let phase = store.phase();
        StatusResponse {
            status: ResponseStatus::Running,
            engine_connected: self.engine_connected(),
            game_active: phase == GamePhase::Active,
            game_phase: phase,
            current_player: board.side_to_move(),
            board_fen: board.fen(),
            relay_mode: self.identity.relay_mode(),
            color: self.identity.color,
            opponent_address: self.identity.peer.as_ref().map(Url::to_string),
            is_my_turn: self.arbiter.report(board.side_to_move()),
            ply: board.ply(),
        }
    }

    pub async fn board_state(&self) -> BoardStateResponse {
        let store = self.store.lock().await;
        let board = store.board();
        BoardStateResponse {
            status: ResponseStatus::Success,
            board_state: board.board_state(),
            current_player: board.side_to_move(),
            game_over: board.is_game_over(),
            board_fen: board.fen(),
            moves: board.history_uci(),
        }
    }

    pub async fn debug_info(&self) -> DebugResponse {
        let store = self.store.lock().await;
        let board = store.board();
        DebugResponse {
            board_fen: board.fen(),
            legal_moves: board.legal_moves(),
            turn: board.side_to_move(),
        }
    }
}

fn parse_request(request: &MoveRequest) -> NodeResult<MoveSpec> {
    let present = |s: &Option<String>| s.as_deref().filter(|s| !s.trim().is_empty()).map(str::to_string);
    let (Some(from), Some(to)) = (present(&request.from), present(&request.to)) else {
        return Err(NodeError::bad_request("Missing from or to square"));
    };
    Ok(MoveSpec::parse(&from, &to, request.promotion.as_deref())?)
}

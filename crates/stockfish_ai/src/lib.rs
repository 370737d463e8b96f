//! Stockfish (or any UCI engine) behind an async trait
//!
//! The node never talks UCI directly. It holds a `Box<dyn SearchEngine>` and
//! asks for one move at a time with a thinking-time budget:
//!
//! ```rust,ignore
//! let mut engine = UciEngine::spawn("/usr/games/stockfish", &EngineOptions::default()).await?;
//! let best = engine.best_move(&position, Duration::from_secs(2)).await?;
//! engine.shutdown().await?;
//! ```
//!
//! The returned [`UciMove`] is *not* trusted; callers check it against the
//! legal move set before applying it.

pub mod error;
pub mod options;
pub mod process;
pub mod uci;

pub use error::{EngineError, EngineResult};
pub use options::EngineOptions;
pub use process::UciEngine;

use async_trait::async_trait;
use shakmaty::uci::UciMove;
use shakmaty::Chess;
use std::time::Duration;

/// Capability consumed by the node: configure, search, shut down
#[async_trait]
pub trait SearchEngine: Send {
    /// Apply strength settings. Takes effect from the next search.
    async fn configure(&mut self, options: &EngineOptions) -> EngineResult<()>;

    /// Search `position` for at most `budget` and return the engine's choice
    async fn best_move(&mut self, position: &Chess, budget: Duration) -> EngineResult<UciMove>;

    async fn shutdown(&mut self) -> EngineResult<()>;
}

//! UCI line formatting and parsing

use crate::error::{EngineError, EngineResult};
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, EnPassantMode};
use std::time::Duration;

pub fn position_command(position: &Chess) -> String {
    format!(
        "position fen {}",
        Fen::from_position(position.clone(), EnPassantMode::Legal)
    )
}

/// `go movetime` with at least one millisecond
pub fn go_command(budget: Duration) -> String {
    format!("go movetime {}", budget.as_millis().max(1))
}

/// Parse a `bestmove` line.
///
/// Returns `Ok(None)` for lines that are not `bestmove` (info, id, ...), so the
/// caller can keep reading.
pub fn parse_bestmove(line: &str) -> EngineResult<Option<UciMove>> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return Ok(None);
    }
    match tokens.next() {
        Some("(none)") | Some("0000") => Err(EngineError::NoMove),
        Some(mv) => mv
            .parse::<UciMove>()
            .map(Some)
            .map_err(|_| EngineError::Protocol {
                line: line.to_string(),
            }),
        None => Err(EngineError::Protocol {
            line: line.to_string(),
        }),
    }
}

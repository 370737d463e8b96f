use std::time::Duration;

/// Errors talking to the engine process
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Binary could not be started
    #[error("Failed to spawn engine {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Pipe read/write failed
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Process closed its stdout
    #[error("Engine process terminated")]
    Terminated,

    /// No answer within the allowed time
    #[error("Engine did not answer {expected:?} within {waited:?}")]
    Timeout {
        expected: &'static str,
        waited: Duration,
    },

    /// Still silent after `stop`; its late output cannot be trusted
    #[error("Engine unresponsive after stop (waited {waited:?})")]
    Unresponsive { waited: Duration },

    /// Line that should have been a UCI reply was not
    #[error("Unexpected engine output: {line:?}")]
    Protocol { line: String },

    /// `bestmove (none)`: the engine has nothing to play
    #[error("Engine returned no move")]
    NoMove,

    /// Engine was already shut down
    #[error("Engine is not running")]
    NotRunning,
}

impl EngineError {
    /// The process is gone and will not answer again
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Terminated
                | EngineError::Io(_)
                | EngineError::NotRunning
                | EngineError::Unresponsive { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

//! UCI engine running as a child process
//!
//! One request at a time: the caller holds `&mut self` for the whole
//! `position` / `go` / `bestmove` exchange.

use crate::error::{EngineError, EngineResult};
use crate::options::EngineOptions;
use crate::uci;
use crate::SearchEngine;
use async_trait::async_trait;
use log::{debug, info, warn};
use shakmaty::uci::UciMove;
use shakmaty::Chess;
use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{timeout, Instant};

/// Time allowed for `uciok` / `readyok`
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// Extra time after the search budget before the engine is told to stop
const SEARCH_GRACE: Duration = Duration::from_millis(1500);
/// Time allowed to exit after `quit`
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct UciEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    running: bool,
}

impl UciEngine {
    /// Spawn `program`, complete the UCI handshake and apply `options`
    pub async fn spawn(program: impl AsRef<OsStr>, options: &EngineOptions) -> EngineResult<Self> {
        Self::spawn_with_args(program, std::iter::empty::<&str>(), options).await
    }

    pub async fn spawn_with_args<I, S>(
        program: impl AsRef<OsStr>,
        args: I,
        options: &EngineOptions,
    ) -> EngineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: program.to_string_lossy().into_owned(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(EngineError::NotRunning);
        };

        let mut engine = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            running: true,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok", HANDSHAKE_TIMEOUT).await?;
        engine.configure(options).await?;
        info!(
            "[ENGINE] {} ready (elo {}, skill {})",
            program.to_string_lossy(),
            options.elo,
            options.skill
        );
        Ok(engine)
    }

    async fn send(&mut self, command: &str) -> EngineResult<()> {
        if !self.running {
            return Err(EngineError::NotRunning);
        }
        debug!("[ENGINE] >> {}", command);
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self, deadline: Instant, expected: &'static str) -> EngineResult<String> {
        let waited = deadline.saturating_duration_since(Instant::now());
        match timeout(waited, self.stdout.next_line()).await {
            Ok(Ok(Some(line))) => {
                debug!("[ENGINE] << {}", line);
                Ok(line)
            }
            Ok(Ok(None)) => {
                self.running = false;
                Err(EngineError::Terminated)
            }
            Ok(Err(e)) => {
                self.running = false;
                Err(EngineError::Io(e))
            }
            Err(_) => Err(EngineError::Timeout { expected, waited }),
        }
    }

    /// Read until a line equal to `token` shows up. Other lines are dropped.
    async fn wait_for(&mut self, token: &'static str, limit: Duration) -> EngineResult<()> {
        let deadline = Instant::now() + limit;
        loop {
            let line = self.read_line(deadline, token).await?;
            if line.trim() == token {
                return Ok(());
            }
            if line.starts_with("bestmove") {
                debug!("[ENGINE] discarding stale {}", line);
            }
        }
    }

    async fn read_bestmove(&mut self, deadline: Instant) -> EngineResult<UciMove> {
        loop {
            let line = self.read_line(deadline, "bestmove").await?;
            if let Some(mv) = uci::parse_bestmove(&line)? {
                return Ok(mv);
            }
        }
    }
}

#[async_trait]
impl SearchEngine for UciEngine {
    async fn configure(&mut self, options: &EngineOptions) -> EngineResult<()> {
        for command in options.setoption_commands() {
            self.send(&command).await?;
        }
        self.send("isready").await?;
        self.wait_for("readyok", HANDSHAKE_TIMEOUT).await
    }

    async fn best_move(&mut self, position: &Chess, budget: Duration) -> EngineResult<UciMove> {
        // Anything left over from an earlier search is read and dropped here
        self.send("isready").await?;
        self.wait_for("readyok", HANDSHAKE_TIMEOUT).await?;

        self.send(&uci::position_command(position)).await?;
        self.send(&uci::go_command(budget)).await?;

        match self.read_bestmove(Instant::now() + budget + SEARCH_GRACE).await {
            Err(EngineError::Timeout { .. }) => {
                warn!("[ENGINE] search overran {:?}, sending stop", budget);
                self.send("stop").await?;
                match self.read_bestmove(Instant::now() + SEARCH_GRACE).await {
                    Err(EngineError::Timeout { .. }) => {
                        warn!("[ENGINE] no bestmove after stop, killing engine");
                        self.running = false;
                        let _ = self.child.start_kill();
                        Err(EngineError::Unresponsive {
                            waited: budget + SEARCH_GRACE * 2,
                        })
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn shutdown(&mut self) -> EngineResult<()> {
        if !self.running {
            return Ok(());
        }
        // Best effort: the process may already be gone
        let _ = self.send("quit").await;
        self.running = false;
        match timeout(QUIT_TIMEOUT, self.child.wait()).await {
            Ok(status) => {
                info!("[ENGINE] exited with {:?}", status?);
            }
            Err(_) => {
                warn!("[ENGINE] did not exit after quit, killing");
                self.child.kill().await?;
            }
        }
        Ok(())
    }
}

//! Node configuration
//!
//! Built once at startup into a typed [`NodeConfig`]. Sources, highest first:
//!
//! 1. command line flags
//! 2. environment variables (a `.env` file is loaded into the environment
//!    before parsing)
//! 3. the JSON file named by `--config` / `PI_CONFIG`
//! 4. built-in defaults
//!
//! Everything is validated here so a bad value stops the process before the
//! engine is spawned or the port is bound.
//!
//! # File format
//!
//! ```json
//! {
//!   "color": "black",
//!   "opponent_ip": "192.168.10.2",
//!   "opponent_port": 5002,
//!   "think_time_ms": 1500,
//!   "elo": 1600
//! }
//! ```

use crate::core::error::{CoreError, CoreResult};
use backend::{NodeIdentity, NodeSettings};
use chess_logic_shared::PlayerColor;
use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stockfish_ai::options::{DEFAULT_ELO, DEFAULT_SKILL};
use stockfish_ai::EngineOptions;
use tracing::info;
use url::Url;

pub const DEFAULT_OPPONENT_PORT: u16 = 5002;
pub const DEFAULT_BIND: &str = "0.0.0.0:5002";
pub const DEFAULT_ENGINE_PATH: &str = "/usr/games/stockfish";
pub const DEFAULT_THINK_TIME_MS: u64 = 2000;
pub const DEFAULT_RELAY_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_START_DELAY_MS: u64 = 2000;

/// Relay chess node: plays one color with a local engine and relays moves to a peer
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "pi-chess", version, long_about = None)]
pub struct Args {
    /// Color this node plays (white or black)
    #[arg(long, env = "PI_COLOR")]
    pub color: Option<String>,

    /// Peer node host. Setting it enables relay (PI vs PI) mode.
    #[arg(long, env = "OPPONENT_IP")]
    pub opponent_ip: Option<String>,

    /// Peer node port
    #[arg(long, env = "OPPONENT_PORT")]
    pub opponent_port: Option<u16>,

    /// Address the HTTP server listens on
    #[arg(long, env = "PI_BIND")]
    pub bind: Option<String>,

    /// UCI engine binary
    #[arg(long, env = "STOCKFISH_PATH")]
    pub engine_path: Option<PathBuf>,

    /// Engine thinking time per move (milliseconds, or e.g. "1500ms", "2s")
    #[arg(long, env = "PI_THINK_TIME", value_parser = parse_duration)]
    pub think_time: Option<Duration>,

    /// Timeout for one relay POST to the peer
    #[arg(long, env = "PI_RELAY_TIMEOUT", value_parser = parse_duration)]
    pub relay_timeout: Option<Duration>,

    /// Delay before white opens the game in relay mode
    #[arg(long, env = "PI_START_DELAY", value_parser = parse_duration)]
    pub start_delay: Option<Duration>,

    /// Engine strength (clamped to 1350..=2850)
    #[arg(long, env = "PI_ELO", allow_negative_numbers = true)]
    pub elo: Option<i64>,

    /// Engine skill level (clamped to 0..=20)
    #[arg(long, env = "PI_SKILL", allow_negative_numbers = true)]
    pub skill: Option<i64>,

    /// Log filter, e.g. "info" or "backend=debug". Overrides RUST_LOG.
    #[arg(long, env = "PI_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Optional JSON config file
    #[arg(long, env = "PI_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Shape of the optional JSON config file. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub color: Option<String>,
    pub opponent_ip: Option<String>,
    pub opponent_port: Option<u16>,
    pub bind: Option<String>,
    pub engine_path: Option<PathBuf>,
    pub think_time_ms: Option<u64>,
    pub relay_timeout_ms: Option<u64>,
    pub start_delay_ms: Option<u64>,
    pub elo: Option<i64>,
    pub skill: Option<i64>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| CoreError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Validated configuration for one node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub color: PlayerColor,
    /// `Some` in relay mode
    pub opponent: Option<Url>,
    pub bind: SocketAddr,
    pub engine_path: PathBuf,
    pub think_time: Duration,
    pub relay_timeout: Duration,
    pub start_delay: Duration,
    pub engine: EngineOptions,
    pub log_level: Option<String>,
}

impl NodeConfig {
    /// Merge parsed flags/env with the config file they point at
    pub fn from_args(args: Args) -> CoreResult<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    pub fn merge(args: Args, file: FileConfig) -> CoreResult<Self> {
        let color = match args.color.or(file.color) {
            Some(value) => value
                .parse::<PlayerColor>()
                .map_err(|_| CoreError::InvalidColor { value })?,
            None => PlayerColor::White,
        };

        let opponent_port = args
            .opponent_port
            .or(file.opponent_port)
            .unwrap_or(DEFAULT_OPPONENT_PORT);
        let opponent = args
            .opponent_ip
            .or(file.opponent_ip)
            .filter(|host| !host.trim().is_empty())
            .map(|host| opponent_url(host.trim(), opponent_port))
            .transpose()?;

        let bind = args
            .bind
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse::<SocketAddr>()
            .map_err(|source| CoreError::InvalidBind {
                address: bind.clone(),
                source,
            })?;

        let think_time = args
            .think_time
            .or(file.think_time_ms.map(Duration::from_millis))
            .unwrap_or(Duration::from_millis(DEFAULT_THINK_TIME_MS));
        let relay_timeout = args
            .relay_timeout
            .or(file.relay_timeout_ms.map(Duration::from_millis))
            .unwrap_or(Duration::from_millis(DEFAULT_RELAY_TIMEOUT_MS));
        let start_delay = args
            .start_delay
            .or(file.start_delay_ms.map(Duration::from_millis))
            .unwrap_or(Duration::from_millis(DEFAULT_START_DELAY_MS));
        if think_time.is_zero() {
            return Err(CoreError::ZeroDuration { field: "think_time" });
        }
        if relay_timeout.is_zero() {
            return Err(CoreError::ZeroDuration {
                field: "relay_timeout",
            });
        }

        let engine = EngineOptions::clamped(
            args.elo.or(file.elo).unwrap_or(i64::from(DEFAULT_ELO)),
            args.skill.or(file.skill).unwrap_or(i64::from(DEFAULT_SKILL)),
        );

        Ok(Self {
            color,
            opponent,
            bind,
            engine_path: args
                .engine_path
                .or(file.engine_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE_PATH)),
            think_time,
            relay_timeout,
            start_delay,
            engine,
            log_level: args.log_level.or(file.log_level),
        })
    }

    pub fn relay_mode(&self) -> bool {
        self.opponent.is_some()
    }

    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity {
            color: self.color,
            peer: self.opponent.clone(),
        }
    }

    pub fn settings(&self) -> NodeSettings {
        NodeSettings {
            think_time: self.think_time,
            relay_timeout: self.relay_timeout,
            start_delay: self.start_delay,
        }
    }

    /// Startup banner
    pub fn log_summary(&self) {
        match &self.opponent {
            Some(peer) => {
                info!("[CONFIG] PI vs PI mode: ENABLED");
                info!("[CONFIG] This node plays: {}", self.color.as_str().to_uppercase());
                info!("[CONFIG] Opponent node: {}", peer);
            }
            None => info!("[CONFIG] PI vs PI mode: DISABLED (user vs engine)"),
        }
        info!("[CONFIG] {}", self);
    }
}

impl fmt::Display for NodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bind={} engine={} think={} relay_timeout={} elo={} skill={}",
            self.bind,
            self.engine_path.display(),
            humantime::format_duration(self.think_time),
            humantime::format_duration(self.relay_timeout),
            self.engine.elo,
            self.engine.skill
        )
    }
}

/// Bare numbers are milliseconds; anything else goes through humantime
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if let Ok(ms) = value.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(value).map_err(|e| format!("invalid duration {value:?}: {e}"))
}

/// `host` may be a bare host/IP or a full `http://` URL
fn opponent_url(host: &str, port: u16) -> CoreResult<Url> {
    let invalid = |reason: String| CoreError::InvalidOpponent {
        address: host.to_string(),
        reason,
    };

    let mut url = if host.contains("://") {
        Url::parse(host).map_err(|e| invalid(e.to_string()))?
    } else {
        Url::parse(&format!("http://{host}:{port}")).map_err(|e| invalid(e.to_string()))?
    };
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    if url.port().is_none() && host.contains("://") {
        url.set_port(Some(port))
            .map_err(|_| invalid("cannot set port".to_string()))?;
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_accepts_millis_and_humantime() {
        assert_eq!(parse_duration("1500").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_opponent_url_forms() {
        let url = opponent_url("192.168.10.3", 5002).unwrap();
        assert_eq!(url.as_str(), "http://192.168.10.3:5002/");

        let url = opponent_url("http://black.local", 6000).unwrap();
        assert_eq!(url.as_str(), "http://black.local:6000/");

        let url = opponent_url("http://black.local:7000", 6000).unwrap();
        assert_eq!(url.port(), Some(7000));

        assert!(opponent_url("ftp://black.local", 6000).is_err());
        assert!(opponent_url("bad host", 6000).is_err());
    }
}

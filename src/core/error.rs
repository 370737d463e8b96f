//! Error types for core module
//!
//! Everything that can go wrong while turning flags, environment variables and
//! the optional JSON file into a [`super::NodeConfig`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum CoreError {
    /// Config file could not be read
    #[error("Config file I/O error at {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON or has unknown keys
    #[error("Config file parse error at {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid color {value:?}: expected white or black")]
    InvalidColor { value: String },

    /// Opponent host/port do not form a usable URL
    #[error("Invalid opponent address {address}: {reason}")]
    InvalidOpponent { address: String, reason: String },

    #[error("Invalid bind address {address}: {source}")]
    InvalidBind {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

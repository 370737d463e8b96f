//! Core module - configuration and startup plumbing for the node binary
//!
//! - [`config`] - flags, environment, JSON file and defaults merged into one
//!   validated [`NodeConfig`]
//! - [`error`] - [`CoreError`] for everything that can go wrong before the
//!   server starts

pub mod config;
pub mod error;

pub use config::{Args, FileConfig, NodeConfig};
pub use error::{CoreError, CoreResult};

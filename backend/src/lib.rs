//! Relay chess node
//!
//! One [`node::Node`] owns one game. It is shared between axum handlers and
//! background auto-move tasks through an `Arc`:
//!
//! - [`store`] - position plus lifecycle, behind the node's move lock
//! - [`turn`] - the turn arbiter (pure)
//! - [`relay`] - outbound HTTP client to the peer node
//! - [`api`] - inbound HTTP routes
//! - [`error`] - error taxonomy and its HTTP mapping

pub mod api;
pub mod error;
pub mod node;
pub mod relay;
pub mod store;
pub mod turn;

pub use error::{NodeError, NodeResult};
pub use node::{Node, NodeIdentity, NodeSettings};

//! Outbound relay to the peer node
//!
//! Best effort: one POST per move, bounded by a timeout, never retried. The
//! caller logs a failure and keeps its local position.

use shared::protocol::RelayedMove;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Path on the peer that accepts relayed moves
pub const RECEIVE_PATH: &str = "api/receive-opponent-move";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid peer address {address}: {source}")]
    Address {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build relay client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection refused, timeout, DNS...
    #[error("Peer unreachable: {0}")]
    PeerUnreachable(#[source] reqwest::Error),

    /// Peer answered but did not accept the move
    #[error("Peer rejected move with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    peer: Url,
    endpoint: Url,
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(peer: Url, timeout: Duration) -> Result<Self, RelayError> {
        let endpoint = peer.join(RECEIVE_PATH).map_err(|source| RelayError::Address {
            address: peer.to_string(),
            source,
        })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RelayError::Client)?;
        Ok(Self {
            peer,
            endpoint,
            http,
        })
    }

    pub fn peer(&self) -> &Url {
        &self.peer
    }

    pub async fn send_move(&self, relayed: &RelayedMove) -> Result<(), RelayError> {
        debug!(
            "[RELAY] POST {} {}{} (ply {})",
            self.endpoint, relayed.from, relayed.to, relayed.ply
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(relayed)
            .send()
            .await
            .map_err(RelayError::PeerUnreachable)?;

        let status = response.status();
        if status.is_success() {
            info!("[RELAY] Move {} accepted by {}", relayed.san, self.peer);
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

//! Shared helpers for the backend integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use backend::{api, Node, NodeIdentity, NodeSettings};
use chess_logic_shared::shakmaty::uci::UciMove;
use chess_logic_shared::shakmaty::{CastlingMode, Chess, Position};
use chess_logic_shared::PlayerColor;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stockfish_ai::{EngineError, EngineOptions, EngineResult, SearchEngine};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

/// In-process engine: plays the first legal move, optionally late or wrong
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    pub searches: Arc<AtomicUsize>,
    /// Stop answering after this many searches
    pub limit: Option<usize>,
    /// Answer with a move that is never legal from the start position
    pub illegal: bool,
    pub delay: Duration,
}

impl ScriptedEngine {
    pub fn first_legal() -> Self {
        Self::default()
    }

    pub fn limited(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn illegal() -> Self {
        Self {
            illegal: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Counter handle that outlives the boxed engine
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.searches)
    }

    pub fn boxed(self) -> Option<Box<dyn SearchEngine>> {
        Some(Box::new(self))
    }
}

#[async_trait]
impl SearchEngine for ScriptedEngine {
    async fn configure(&mut self, _options: &EngineOptions) -> EngineResult<()> {
        Ok(())
    }

    async fn best_move(&mut self, position: &Chess, _budget: Duration) -> EngineResult<UciMove> {
        let done = self.searches.fetch_add(1, Ordering::SeqCst);
        if self.limit.is_some_and(|limit| done >= limit) {
            return Err(EngineError::NoMove);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.illegal {
            return Ok("e1e8".parse().expect("valid uci"));
        }
        position
            .legal_moves()
            .first()
            .map(|m| m.to_uci(CastlingMode::Standard))
            .ok_or(EngineError::NoMove)
    }

    async fn shutdown(&mut self) -> EngineResult<()> {
        Ok(())
    }
}

pub fn test_settings() -> NodeSettings {
    NodeSettings {
        think_time: Duration::from_millis(10),
        relay_timeout: Duration::from_secs(2),
        start_delay: Duration::ZERO,
    }
}

pub fn node(
    color: PlayerColor,
    peer: Option<Url>,
    engine: Option<Box<dyn SearchEngine>>,
) -> Arc<Node> {
    let identity = NodeIdentity { color, peer };
    Arc::new(Node::new(identity, test_settings(), engine).expect("node"))
}

pub fn solo_node(engine: Option<Box<dyn SearchEngine>>) -> Arc<Node> {
    node(PlayerColor::White, None, engine)
}

/// Address nothing listens on
pub fn dead_peer() -> Url {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    Url::parse(&format!("http://127.0.0.1:{port}")).unwrap()
}

pub fn url_of(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{addr}")).unwrap()
}

pub fn serve(listener: TcpListener, node: Arc<Node>) {
    tokio::spawn(async move {
        axum::serve(listener, api::router(node)).await.unwrap();
    });
}

/// White and black wired to each other over loopback HTTP
pub async fn spawn_pair(
    white_engine: ScriptedEngine,
    black_engine: ScriptedEngine,
) -> (Arc<Node>, Arc<Node>) {
    let white_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let black_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let white_addr = white_listener.local_addr().unwrap();
    let black_addr = black_listener.local_addr().unwrap();

    let white = node(
        PlayerColor::White,
        Some(url_of(black_addr)),
        white_engine.boxed(),
    );
    let black = node(
        PlayerColor::Black,
        Some(url_of(white_addr)),
        black_engine.boxed(),
    );
    serve(white_listener, Arc::clone(&white));
    serve(black_listener, Arc::clone(&black));
    (white, black)
}

/// Poll until the node reaches `ply` or give up after a few seconds
pub async fn wait_for_ply(node: &Node, ply: usize) -> bool {
    for _ in 0..300 {
        if node.status().await.ply == ply {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

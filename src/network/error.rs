use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("invalid hub url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("negotiation failed: {0}")]
    Negotiate(String),
    #[error("negotiate request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timed out after {elapsed:?} waiting for {operation}")]
    Timeout {
        elapsed: Duration,
        operation: &'static str,
    },
    #[error("cannot send data if the connection is not in the Connected state")]
    NotConnected,
    #[error("connection has already been started")]
    AlreadyStarted,
}

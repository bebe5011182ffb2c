//! Error types for the RPC client.
//!
//! Errors fall into exactly the two kinds the sync coordinator needs to
//! distinguish: [`RpcError::Transport`] (connect, TLS, read, timeout) and
//! [`RpcError::Protocol`] (non-200 status, JSON parse failure, a JSON-RPC
//! `error` field in the response). Both are handled identically by callers
//! (backoff + batch halving) but are kept distinct for logging.

use thiserror::Error;

/// Result type alias using [`RpcError`].
pub type Result<T> = std::result::Result<T, RpcError>;

/// Errors that can occur when talking to the JSON-RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection, TLS, read, or deadline failure below the JSON-RPC layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint responded, but the response was not a usable JSON-RPC
    /// result: non-200 status, malformed JSON, or an `error` field in a
    /// response envelope.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RpcError {
    pub(crate) fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::transport(err.to_string())
        } else {
            Self::protocol(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol(format!("json decode: {err}"))
    }
}

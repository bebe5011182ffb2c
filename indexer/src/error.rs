//! Layered error types for the indexer.
//!
//! - [`DecodeError`] — shape mismatches in the Log Decoder; always fatal.
//! - [`StoreError`] — storage-layer failures (SQL errors, advisory-lock loss).
//! - [`AppError`] — the top-level enum the Sync Coordinator and `main`
//!   operate over; [`AppError::is_fatal`] decides process exit vs. retry
//!   per spec §7's propagation policy.
//! - [`ApiError`] — wraps `AppError` for the Query Server, mapping variants
//!   to the HTTP status codes in spec §4.6/§7.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rpc_client::RpcError;
use serde_json::json;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DECODE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors raised by the Log Decoder. Spec §4.2: "the raw log did not match
/// the asserted ABI" — a programming error, never retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// A fixed-layout event had the wrong number of indexed topics.
    #[error("unexpected topic count for {event}: got {got}, want {want}")]
    TopicCount {
        /// Event name being decoded.
        event: &'static str,
        /// Topics actually present.
        got: usize,
        /// Topics the ABI requires.
        want: usize,
    },

    /// A dynamic field's data payload was shorter than its declared length.
    #[error("data length mismatch in {event}: {detail}")]
    DataLength {
        /// Event name being decoded.
        event: &'static str,
        /// Human-readable detail (offset, expected length, etc).
        detail: String,
    },

    /// `(address, topic0)` matched none of the known event selectors.
    #[error("unknown selector: address={address} topic0={topic0}")]
    UnknownSelector {
        /// Lowercased contract address.
        address: String,
        /// Lowercased topic0 hash.
        topic0: String,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// STORE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from the Store layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Underlying SQL engine error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The cross-process advisory file lock could not be acquired at
    /// startup (another indexer process is already the writer).
    #[error("could not acquire advisory write lock on {0}")]
    LockHeld(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICATION ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Top-level error type the Sync Coordinator and `main` operate over.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    /// RPC transport or protocol failure. Never fatal; triggers backoff.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Log decode failure. Always fatal.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Store failure. Always fatal.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Config file unreadable or malformed. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Config file readable but semantically invalid (failed `validate`).
    #[error("invalid configuration: {0}")]
    ConfigInvalid(Vec<String>),

    /// User address not found for a user-scoped query.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// A query-parameter or `/api/query` validation failure.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A rebuild was requested while one was already running.
    #[error("rebuild already running")]
    RebuildInProgress,
}

/// Type alias for application `Result`s.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether this error represents an invariant violation that must abort
    /// the process (spec §7: "any invariant violation... is fatal so that a
    /// corrupt state cannot accumulate"), as opposed to a transient RPC
    /// failure the Coordinator recovers from via backoff.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Rpc(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API ERRORS (HTTP-specific)
// ═══════════════════════════════════════════════════════════════════════════════

/// Wraps [`AppError`] for Query Server handlers, mapping to HTTP status
/// codes per spec §4.6/§7.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::UserNotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            AppError::InvalidQuery(_) | AppError::ConfigInvalid(_) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            AppError::RebuildInProgress => (StatusCode::CONFLICT, self.0.to_string()),
            other => {
                tracing::error!(error = %other, "query server internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_errors_are_not_fatal() {
        let err = AppError::Rpc(RpcError::Transport("timeout".into()));
        assert!(!err.is_fatal());
    }

    #[test]
    fn decode_errors_are_fatal() {
        let err = AppError::Decode(DecodeError::UnknownSelector {
            address: "0xdead".into(),
            topic0: "0xbeef".into(),
        });
        assert!(err.is_fatal());
    }

    #[test]
    fn user_not_found_maps_to_404() {
        let resp = ApiError(AppError::UserNotFound("0xabc".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn rebuild_in_progress_maps_to_409() {
        let resp = ApiError(AppError::RebuildInProgress).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}

//! On-chain indexer and PnL replay engine for a prediction-market protocol.
//!
//! Indexes `ConditionalTokens`, the CTF and neg-risk exchanges, the
//! neg-risk adapter, and dynamically-discovered FPMM pools into an
//! embedded SQLite database, then replays the recorded events into
//! per-user positions and realized PnL on demand.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │  rpc-client  │─▶│    decoder   │─▶│     sync     │─▶│    store     │
//! │ (eth_getLogs)│  │ (Log Decoder)│  │ (Coordinator)│  │ (SQLite)     │
//! └──────────────┘  └──────────────┘  └──────────────┘  └──────┬───────┘
//!                                                               │
//!                            ┌──────────────┐  ┌──────────────┐│
//!                            │     api      │◀─│    replay    │◀
//!                            │ (Query Server│  │ (PnL engine) │
//!                            └──────────────┘  └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`] — configuration loading and validation
//! - [`error`] — layered error types
//! - [`decoder`] — the Log Decoder: raw logs to typed rows
//! - [`store`] — the Store: the sole owner of the SQLite database file
//! - [`sync`] — the Sync Coordinator: drives ingestion
//! - [`replay`] — the Replay Engine: rebuilds per-user PnL state
//! - [`api`] — the Query Server: read-only HTTP API

pub mod api;
pub mod config;
pub mod decoder;
pub mod error;
pub mod replay;
pub mod store;
pub mod sync;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}

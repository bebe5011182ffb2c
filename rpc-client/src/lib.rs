//! JSON-RPC client for `eth_blockNumber` and batched `eth_getLogs`.
//!
//! This is the leaf dependency of the indexer's ingestion pipeline: it knows
//! nothing about the prediction-market ABI or the Store. It constructs
//! requests, parses responses, and exposes the response byte count so the
//! sync coordinator can feed its throughput estimator.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  indexer (sync coordinator, decoder)     │
//! └───────────────────┬───────────────────────┘
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rpc-client ◄── YOU ARE HERE             │
//! │  └─ head_block / get_logs_batch          │
//! └─────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// ═══════════════════════════════════════════════════════════════════════════════
// RE-EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

pub use client::{LogsBatchResult, RpcClient};
pub use config::ClientConfig;
pub use error::{Result, RpcError};
pub use types::{from_hex, to_hex, LogQuery, RawLog};

// ═══════════════════════════════════════════════════════════════════════════════
// CRATE INFO
// ═══════════════════════════════════════════════════════════════════════════════

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }

    #[test]
    fn exports_are_available() {
        let _: fn() -> Result<RpcClient> = || RpcClient::new("http://localhost", "");
        let _: ClientConfig = ClientConfig::default();
    }
}

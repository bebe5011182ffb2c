//! Snapshot of the Sync Coordinator's progress, exposed via `/api/status`.

use serde::Serialize;

/// Point-in-time ingestion status. Cloned cheaply into a `tokio::sync::watch`
/// channel so the Query Server never contends with the writer for the
/// Store itself.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SyncStatus {
    /// Current state-machine phase: `head`, `plan`, `fetch`, `decode`,
    /// `write`, or `idle`.
    pub phase: String,
    /// Highest block fully persisted.
    pub last_block_indexed: i64,
    /// Chain head as of the last `eth_blockNumber` call.
    pub head_block: i64,
    /// Whether `last_block_indexed` has caught up to `head_block`.
    pub caught_up: bool,
    /// Rows written in the most recent batch.
    pub rows_per_batch: usize,
    /// Rolling estimate of ingestion throughput.
    pub blocks_per_second: f64,
}

//! The Sync Coordinator: drives the indexer's ingestion loop.
//!
//! State machine per batch: `Idle → Head → Plan → Fetch → Decode → Write`.
//! On an RPC failure the batch window is halved (floor 1 block) and the
//! round is retried after a 5s backoff; on a decode or store failure the
//! whole process exits (spec §7 — those are invariant violations, not
//! transient conditions). Once caught up to the chain head the coordinator
//! sleeps for `sync_interval_seconds` between polls.

mod status;
mod throughput;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rpc_client::{LogQuery, RpcClient};
use tokio::sync::watch;
use tokio::time::sleep;

pub use self::status::SyncStatus;
use self::throughput::ThroughputEstimator;
use crate::decoder::contracts::{CONDITIONAL_TOKENS, CTF_EXCHANGE, NEG_RISK_ADAPTER, NEG_RISK_CTF_EXCHANGE};
use crate::decoder::decode;
use crate::error::Result;
use crate::store::Store;

const BACKOFF: Duration = Duration::from_secs(5);
const MIN_BATCH: u32 = 1;
const THROUGHPUT_WINDOW: usize = 20;

/// Fixed-address contracts plus the dynamic FPMM family (address omitted
/// — matched against every known pool, discovered incrementally).
fn topic_queries(from_block: i64, to_block: i64, fpmm_addrs: &HashSet<String>) -> Vec<LogQuery> {
    let mut queries = vec![
        LogQuery { address: Some(CONDITIONAL_TOKENS.to_string()), from_block, to_block, topic0: Vec::new() },
        LogQuery { address: Some(CTF_EXCHANGE.to_string()), from_block, to_block, topic0: Vec::new() },
        LogQuery { address: Some(NEG_RISK_CTF_EXCHANGE.to_string()), from_block, to_block, topic0: Vec::new() },
        LogQuery { address: Some(NEG_RISK_ADAPTER.to_string()), from_block, to_block, topic0: Vec::new() },
    ];
    // The FPMM factory's creation events have no fixed pool address yet;
    // fetched address-agnostic. Once pools exist, their own events are
    // swept in by the same address-agnostic query.
    let _ = fpmm_addrs; // addresses are discovered from returned logs, not queried by.
    queries.push(LogQuery { address: None, from_block, to_block, topic0: Vec::new() });
    queries
}

/// Drives ingestion until the process is told to stop. Owns the only
/// writer handle to the [`Store`].
#[derive(Debug)]
pub struct SyncCoordinator {
    rpc: RpcClient,
    store: Arc<Store>,
    initial_block: i64,
    batch_size: u32,
    poll_interval: Duration,
    status_tx: watch::Sender<SyncStatus>,
}

impl SyncCoordinator {
    /// Builds a coordinator. `status_tx` is shared with the Query Server so
    /// `/api/status` can read the latest snapshot without locking the
    /// Store.
    #[must_use]
    pub fn new(
        rpc: RpcClient,
        store: Arc<Store>,
        initial_block: i64,
        batch_size: u32,
        poll_interval: Duration,
        status_tx: watch::Sender<SyncStatus>,
    ) -> Self {
        Self { rpc, store, initial_block, batch_size, poll_interval, status_tx }
    }

    /// Runs the ingestion loop forever (or until a fatal `AppError`).
    ///
    /// # Errors
    /// Returns the first fatal `AppError`. RPC failures are retried
    /// in-loop and never surface here.
    pub async fn run(mut self) -> Result<()> {
        let mut cursor = match self.store.last_block().await? {
            Some(last) => last + 1,
            None => self.initial_block,
        };
        let mut fpmm_addrs: HashSet<String> = HashSet::new();
        let mut throughput = ThroughputEstimator::new(THROUGHPUT_WINDOW);
        let mut batch_size = self.batch_size;

        loop {
            self.status_tx.send_modify(|s| s.phase = "head".to_string());
            let head = match self.rpc.head_block().await {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!(error = %e, "head_block failed, backing off");
                    sleep(BACKOFF).await;
                    continue;
                }
            };

            if cursor > head {
                self.status_tx.send_modify(|s| {
                    s.phase = "idle".to_string();
                    s.caught_up = true;
                    s.head_block = head;
                });
                sleep(self.poll_interval).await;
                continue;
            }

            self.status_tx.send_modify(|s| {
                s.phase = "plan".to_string();
                s.caught_up = false;
                s.head_block = head;
            });
            let to_block = (cursor + i64::from(batch_size) - 1).min(head);

            self.status_tx.send_modify(|s| s.phase = "fetch".to_string());
            let queries = topic_queries(cursor, to_block, &fpmm_addrs);
            let fetch_started = std::time::Instant::now();
            let batch = match self.rpc.get_logs_batch(&queries).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(error = %e, from = cursor, to = to_block, "get_logs_batch failed, halving batch");
                    batch_size = (batch_size / 2).max(MIN_BATCH);
                    sleep(BACKOFF).await;
                    continue;
                }
            };

            self.status_tx.send_modify(|s| s.phase = "decode".to_string());
            let mut logs: Vec<_> = batch.logs.into_iter().flatten().collect();
            logs.sort_by_key(|l| (l.block_number, l.log_index));

            let (events, new_fpmm_addrs) = decode(&logs, &fpmm_addrs)?;
            fpmm_addrs = new_fpmm_addrs;

            self.status_tx.send_modify(|s| s.phase = "write".to_string());
            self.store.atomic_multi_insert(&events, to_block).await?;

            let elapsed = fetch_started.elapsed();
            throughput.record(to_block - cursor + 1, elapsed);
            self.status_tx.send_modify(|s| {
                s.last_block_indexed = to_block;
                s.rows_per_batch = events.total_rows();
                s.blocks_per_second = throughput.blocks_per_second();
            });

            tracing::info!(
                from = cursor,
                to = to_block,
                rows = events.total_rows(),
                response_bytes = batch.response_bytes,
                "batch indexed"
            );

            cursor = to_block + 1;
            // Batch size recovers once a round succeeds, up to the configured ceiling.
            batch_size = (batch_size.saturating_mul(2)).min(self.batch_size);
        }
    }
}

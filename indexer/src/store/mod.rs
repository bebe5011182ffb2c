//! The Store: the sole owner of the SQLite database file (spec §4.3).
//!
//! Writes go through [`Store::atomic_multi_insert`], which wraps an entire
//! decoded batch — every event-log row plus every entity upsert — in one
//! SQL transaction, so a crash mid-batch leaves `sync_state.last_block`
//! and the rows it describes consistent with each other. Reads go through
//! [`Store::query_rows`], a single parameterless `SELECT` used by the Query
//! Server's generic `/api/query` endpoint and by the Replay Engine's bulk
//! table scans.

mod lock;
mod schema;

use std::path::Path;

use parking_lot::Mutex as SyncMutex;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, SqlitePool, TypeInfo};
use tokio::sync::Mutex as AsyncMutex;

use self::lock::AdvisoryLock;
use crate::decoder::rows::ParsedEvents;
use crate::error::StoreError;

/// Owns the SQLite connection pool, the cross-process advisory lock, and
/// an in-process write mutex that serializes `atomic_multi_insert` calls
/// against concurrent Query Server reads of `last_block`.
#[derive(Debug)]
pub struct Store {
    pool: SqlitePool,
    _lock: AdvisoryLock,
    write_gate: AsyncMutex<()>,
    last_block_cache: SyncMutex<Option<i64>>,
}

impl Store {
    /// Opens (creating if absent) the database at `db_path`, acquires the
    /// advisory write lock, and applies the schema.
    ///
    /// # Errors
    /// Returns `StoreError::LockHeld` if another process holds the writer
    /// lock, or `StoreError::Database` on any SQL failure.
    pub async fn open(db_path: &str) -> Result<Self, StoreError> {
        let path = Path::new(db_path);
        let lock = AdvisoryLock::acquire(path)?;

        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(8).connect_with(options).await?;

        let store = Self { pool, _lock: lock, write_gate: AsyncMutex::new(()), last_block_cache: SyncMutex::new(None) };
        store.init_schema().await?;
        Ok(store)
    }

    /// Applies the full schema. Idempotent.
    ///
    /// # Errors
    /// Returns `StoreError::Database` on SQL failure.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(schema::SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// The last block the sync coordinator has fully persisted, or `None`
    /// if the database is empty.
    ///
    /// # Errors
    /// Returns `StoreError::Database` on SQL failure.
    pub async fn last_block(&self) -> Result<Option<i64>, StoreError> {
        if let Some(cached) = *self.last_block_cache.lock() {
            return Ok(Some(cached));
        }
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM sync_state WHERE key = 'last_block'")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|(v,)| v.parse().ok()))
    }

    /// Number of rows in `table`. Used by diagnostics and tests; `table`
    /// must be one of the fixed schema names, never user input.
    ///
    /// # Errors
    /// Returns `StoreError::Database` on SQL failure.
    pub async fn count(&self, table: &'static str) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Runs an arbitrary read-only `SELECT` and returns each row as a JSON
    /// object keyed by column name. The caller (Query Server) is
    /// responsible for rejecting non-`SELECT` statements before this is
    /// reached.
    ///
    /// # Errors
    /// Returns `StoreError::Database` on SQL failure.
    pub async fn query_rows(&self, sql: &str) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// Persists one decoded batch and advances `last_block`, atomically.
    ///
    /// # Errors
    /// Returns `StoreError::Database` on any failure; the whole batch is
    /// rolled back (spec §4.3 invariant 1).
    pub async fn atomic_multi_insert(&self, events: &ParsedEvents, new_last_block: i64) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        for r in &events.transfers {
            sqlx::query(
                "INSERT OR IGNORE INTO transfer (block_number, log_index, from_addr, to_addr, token_id, amount) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.from_addr)
            .bind(&r.to_addr)
            .bind(&r.token_id)
            .bind(r.amount)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.splits {
            sqlx::query(
                "INSERT OR IGNORE INTO split (block_number, log_index, stakeholder, condition_id, amount) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.stakeholder)
            .bind(&r.condition_id)
            .bind(r.amount)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.merges {
            sqlx::query(
                "INSERT OR IGNORE INTO merge (block_number, log_index, stakeholder, condition_id, amount) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.stakeholder)
            .bind(&r.condition_id)
            .bind(r.amount)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.redemptions {
            sqlx::query(
                "INSERT OR IGNORE INTO redemption (block_number, log_index, redeemer, condition_id, index_sets, payout) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.redeemer)
            .bind(&r.condition_id)
            .bind(r.index_sets)
            .bind(r.payout)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.condition_preparations {
            sqlx::query(
                "INSERT OR IGNORE INTO condition_preparation \
                 (block_number, log_index, condition_id, oracle, question_id, outcome_slot_count) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.condition_id)
            .bind(&r.oracle)
            .bind(&r.question_id)
            .bind(r.outcome_slot_count)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT OR IGNORE INTO condition (condition_id, oracle, question_id, outcome_slot_count, payout_numerators, resolution_block) \
                 VALUES (?, ?, ?, ?, NULL, NULL)",
            )
            .bind(&r.condition_id)
            .bind(&r.oracle)
            .bind(&r.question_id)
            .bind(r.outcome_slot_count)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.condition_resolutions {
            let numerators_json = serde_json::to_string(&r.payout_numerators).unwrap_or_default();

            sqlx::query(
                "INSERT OR IGNORE INTO condition_resolution (block_number, log_index, condition_id, payout_numerators) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.condition_id)
            .bind(&numerators_json)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE condition SET payout_numerators = ?, resolution_block = ? WHERE condition_id = ?",
            )
            .bind(&numerators_json)
            .bind(r.block_number)
            .bind(&r.condition_id)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.order_fills {
            sqlx::query(
                "INSERT OR IGNORE INTO order_filled \
                 (block_number, log_index, exchange, maker, taker, token_id, side, usdc_amount, token_amount, fee) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.exchange)
            .bind(&r.maker)
            .bind(&r.taker)
            .bind(&r.token_id)
            .bind(r.side.as_i64())
            .bind(r.usdc_amount)
            .bind(r.token_amount)
            .bind(r.fee)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.token_registrations {
            sqlx::query(
                "INSERT OR IGNORE INTO token_map (token_id, complement_token_id, condition_id, is_yes) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&r.token_id)
            .bind(&r.complement_token_id)
            .bind(&r.condition_id)
            .bind(i64::from(r.is_yes))
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.positions_converted {
            sqlx::query(
                "INSERT OR IGNORE INTO convert (block_number, log_index, stakeholder, market_id, index_set, amount) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.stakeholder)
            .bind(&r.market_id)
            .bind(r.index_set)
            .bind(r.amount)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.markets_prepared {
            sqlx::query("INSERT OR IGNORE INTO neg_risk_market (market_id, oracle, fee_bips, data) VALUES (?, ?, ?, ?)")
                .bind(&r.market_id)
                .bind(&r.oracle)
                .bind(r.fee_bips)
                .bind(&r.data)
                .execute(&mut *tx)
                .await?;
        }

        for r in &events.questions_prepared {
            sqlx::query(
                "INSERT OR IGNORE INTO neg_risk_question (question_id, market_id, question_index, data) VALUES (?, ?, ?, ?)",
            )
            .bind(&r.question_id)
            .bind(&r.market_id)
            .bind(r.question_index)
            .bind(&r.data)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.fpmm_creations {
            sqlx::query(
                "INSERT OR IGNORE INTO fpmm (fpmm_addr, condition_id, collateral_token, fee, creation_block) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&r.fpmm_addr)
            .bind(&r.condition_id)
            .bind(&r.collateral_token)
            .bind(r.fee)
            .bind(r.block_number)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.fpmm_trades {
            sqlx::query(
                "INSERT OR IGNORE INTO fpmm_trade \
                 (block_number, log_index, fpmm_addr, trader, side, outcome_index, token_amount, usdc_amount) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.fpmm_addr)
            .bind(&r.trader)
            .bind(r.side.as_i64())
            .bind(r.outcome_index)
            .bind(r.token_amount)
            .bind(r.usdc_amount)
            .execute(&mut *tx)
            .await?;
        }

        for r in &events.fpmm_fundings {
            sqlx::query(
                "INSERT OR IGNORE INTO fpmm_funding \
                 (block_number, log_index, fpmm_addr, funder, side, outcome0_amount, outcome1_amount, shares_amount) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(r.block_number)
            .bind(r.log_index)
            .bind(&r.fpmm_addr)
            .bind(&r.funder)
            .bind(r.side)
            .bind(r.outcome0_amount)
            .bind(r.outcome1_amount)
            .bind(r.shares_amount)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("INSERT INTO sync_state (key, value) VALUES ('last_block', ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
            .bind(new_last_block.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        *self.last_block_cache.lock() = Some(new_last_block);
        Ok(())
    }
}

fn row_to_json(row: &SqliteRow) -> Value {
    let mut obj = Map::new();
    for col in row.columns() {
        let name = col.name().to_string();
        let value = match col.type_info().name() {
            "INTEGER" | "BIGINT" => row.try_get::<i64, _>(col.ordinal()).map_or(Value::Null, Value::from),
            "REAL" | "FLOAT" | "DOUBLE" => row.try_get::<f64, _>(col.ordinal()).map_or(Value::Null, |v| {
                serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
            }),
            "BLOB" => row
                .try_get::<Vec<u8>, _>(col.ordinal())
                .map_or(Value::Null, |b| Value::String(format!("0x{}", hex::encode(b)))),
            _ => row.try_get::<String, _>(col.ordinal()).map_or(Value::Null, Value::from),
        };
        obj.insert(name, value);
    }
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_and_init_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("polysync-test-{}", std::process::id()));
        let _ = std::fs::remove_file(&dir);
        let db_path = dir.to_str().unwrap().to_string();

        let store = Store::open(&db_path).await.expect("open");
        assert_eq!(store.last_block().await.unwrap(), None);
        store.init_schema().await.expect("reinit");

        let _ = std::fs::remove_file(&dir);
        let _ = std::fs::remove_file(format!("{db_path}.lock"));
    }

    #[tokio::test]
    async fn atomic_multi_insert_persists_last_block() {
        let dir = std::env::temp_dir().join(format!("polysync-test-insert-{}", std::process::id()));
        let _ = std::fs::remove_file(&dir);
        let db_path = dir.to_str().unwrap().to_string();

        let store = Store::open(&db_path).await.expect("open");
        store.atomic_multi_insert(&ParsedEvents::default(), 42).await.expect("insert");
        assert_eq!(store.last_block().await.unwrap(), Some(42));

        let _ = std::fs::remove_file(&dir);
        let _ = std::fs::remove_file(format!("{db_path}.lock"));
    }
}

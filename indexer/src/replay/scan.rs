//! Phase 2: scan every raw event table, resolve ids against the Phase 1
//! [`Metadata`], and produce the flat, user-interned [`RawEvent`] list
//! Phase 3 partitions and folds over.
//!
//! A row whose token/condition/fpmm/market id isn't found in `Metadata`
//! (decoded out of order, or referencing a condition that exceeds
//! `MAX_OUTCOMES`) is skipped rather than enqueued — the unresolved count
//! is returned so the caller can log it.

use serde_json::Value;

use super::metadata::Metadata;
use super::types::{EventType, RawEvent, OUTCOME_ALL};
use crate::decoder::rows::Side;
use crate::error::StoreError;
use crate::store::Store;

const MICRO: i64 = 1_000_000;

/// Interns user addresses to small integers so `RawEvent` and the
/// per-user partitioning in Phase 3 avoid repeated string hashing.
#[derive(Debug, Default)]
pub struct UserInterner {
    index: std::collections::HashMap<String, u32>,
    addresses: Vec<String>,
}

impl UserInterner {
    pub fn intern(&mut self, address: &str) -> u32 {
        if let Some(&id) = self.index.get(address) {
            return id;
        }
        let id = u32::try_from(self.addresses.len()).unwrap_or(u32::MAX);
        self.addresses.push(address.to_string());
        self.index.insert(address.to_string(), id);
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, std::collections::HashMap<String, u32>) {
        (self.addresses, self.index)
    }
}

/// Result of a full Phase 2 scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub events: Vec<RawEvent>,
    pub interner: UserInterner,
    /// Rows whose ids couldn't be resolved against `Metadata`.
    pub unresolved: usize,
    /// Rows dropped because their condition exceeds `MAX_OUTCOMES`.
    pub outcome_limit_skipped: usize,
}

/// Scans every event table and returns the unsorted event list plus the
/// completed user interner. The caller sorts by `sort_key` before replay.
///
/// # Errors
/// Returns `StoreError::Database` on SQL failure.
pub async fn scan_all(store: &Store, metadata: &Metadata) -> Result<ScanOutcome, StoreError> {
    let mut out = ScanOutcome::default();

    scan_transfers(store, metadata, &mut out).await?;
    scan_splits(store, metadata, &mut out).await?;
    scan_merges(store, metadata, &mut out).await?;
    scan_redemptions(store, metadata, &mut out).await?;
    scan_order_fills(store, metadata, &mut out).await?;
    scan_converts(store, metadata, &mut out).await?;
    scan_fpmm_trades(store, metadata, &mut out).await?;
    scan_fpmm_fundings(store, metadata, &mut out).await?;

    Ok(out)
}

fn str_field(row: &Value, key: &str) -> String {
    row.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn i64_field(row: &Value, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or_default()
}

fn price_of(usdc_amount: i64, token_amount: i64) -> i64 {
    if token_amount == 0 { 0 } else { usdc_amount * MICRO / token_amount }
}

async fn scan_transfers(store: &Store, metadata: &Metadata, out: &mut ScanOutcome) -> Result<(), StoreError> {
    let rows = store.query_rows("SELECT block_number, log_index, from_addr, to_addr, token_id, amount FROM transfer").await?;
    for row in rows {
        let token_id = str_field(&row, "token_id");
        let Some((cond_idx, outcome_idx)) = metadata.resolve_token(&token_id) else {
            out.unresolved += 1;
            continue;
        };
        if !metadata.is_within_outcome_limit(cond_idx) {
            out.outcome_limit_skipped += 1;
            continue;
        }

        let sort_key = RawEvent::linearize(i64_field(&row, "block_number"), i64_field(&row, "log_index"));
        let amount = i64_field(&row, "amount");
        let from_user = out.interner.intern(&str_field(&row, "from_addr"));
        let to_user = out.interner.intern(&str_field(&row, "to_addr"));

        out.events.push(RawEvent {
            sort_key,
            user: from_user,
            cond_idx,
            event_type: EventType::TransferOut,
            token_idx: outcome_idx,
            amount,
            price: 0,
        });
        out.events.push(RawEvent {
            sort_key,
            user: to_user,
            cond_idx,
            event_type: EventType::TransferIn,
            token_idx: outcome_idx,
            amount,
            price: 0,
        });
    }
    Ok(())
}

async fn scan_splits(store: &Store, metadata: &Metadata, out: &mut ScanOutcome) -> Result<(), StoreError> {
    let rows = store.query_rows("SELECT block_number, log_index, stakeholder, condition_id, amount FROM split").await?;
    for row in rows {
        scan_basket_row(&row, metadata, EventType::Split, out);
    }
    Ok(())
}

async fn scan_merges(store: &Store, metadata: &Metadata, out: &mut ScanOutcome) -> Result<(), StoreError> {
    let rows = store.query_rows("SELECT block_number, log_index, stakeholder, condition_id, amount FROM merge").await?;
    for row in rows {
        scan_basket_row(&row, metadata, EventType::Merge, out);
    }
    Ok(())
}

/// Resolves `row`'s `condition_id` and, if valid, pushes a basket-wide
/// event (`token_idx = OUTCOME_ALL`). Shared by Split/Merge.
fn scan_basket_row(row: &Value, metadata: &Metadata, event_type: EventType, out: &mut ScanOutcome) {
    let condition_id = str_field(row, "condition_id");
    let Some(cond_idx) = metadata.cond_idx_for_condition(&condition_id) else {
        out.unresolved += 1;
        return;
    };
    if !metadata.is_within_outcome_limit(cond_idx) {
        out.outcome_limit_skipped += 1;
        return;
    }

    let user = out.interner.intern(&str_field(row, "stakeholder"));
    out.events.push(RawEvent {
        sort_key: RawEvent::linearize(i64_field(row, "block_number"), i64_field(row, "log_index")),
        user,
        cond_idx,
        event_type,
        token_idx: OUTCOME_ALL,
        amount: i64_field(row, "amount"),
        price: 0,
    });
}

async fn scan_redemptions(store: &Store, metadata: &Metadata, out: &mut ScanOutcome) -> Result<(), StoreError> {
    let rows = store.query_rows("SELECT block_number, log_index, redeemer, condition_id, index_sets, payout FROM redemption").await?;
    for row in rows {
        let condition_id = str_field(&row, "condition_id");
        let Some(cond_idx) = metadata.cond_idx_for_condition(&condition_id) else {
            out.unresolved += 1;
            continue;
        };
        if !metadata.is_within_outcome_limit(cond_idx) {
            out.outcome_limit_skipped += 1;
            continue;
        }
        let index_sets = i64_field(&row, "index_sets");
        let Ok(token_idx) = u8::try_from(index_sets) else {
            out.unresolved += 1;
            continue;
        };

        let user = out.interner.intern(&str_field(&row, "redeemer"));
        out.events.push(RawEvent {
            sort_key: RawEvent::linearize(i64_field(&row, "block_number"), i64_field(&row, "log_index")),
            user,
            cond_idx,
            event_type: EventType::Redemption,
            token_idx,
            amount: i64_field(&row, "payout"),
            price: 0,
        });
    }
    Ok(())
}

async fn scan_order_fills(store: &Store, metadata: &Metadata, out: &mut ScanOutcome) -> Result<(), StoreError> {
    let rows = store
        .query_rows("SELECT block_number, log_index, maker, taker, token_id, side, usdc_amount, token_amount FROM order_filled")
        .await?;
    for row in rows {
        let token_id = str_field(&row, "token_id");
        let Some((cond_idx, outcome_idx)) = metadata.resolve_token(&token_id) else {
            out.unresolved += 1;
            continue;
        };
        if !metadata.is_within_outcome_limit(cond_idx) {
            out.outcome_limit_skipped += 1;
            continue;
        }

        let sort_key = RawEvent::linearize(i64_field(&row, "block_number"), i64_field(&row, "log_index"));
        let usdc_amount = i64_field(&row, "usdc_amount");
        let token_amount = i64_field(&row, "token_amount");
        let price = price_of(usdc_amount, token_amount);
        let maker = out.interner.intern(&str_field(&row, "maker"));
        let taker = out.interner.intern(&str_field(&row, "taker"));

        // Maker sells collateral for the token (Buy side): maker acquires
        // the token, taker disposes of it. Maker sells the token (Sell
        // side): the reverse.
        let (buyer, seller) = if i64_field(&row, "side") == Side::Sell.as_i64() {
            (taker, maker)
        } else {
            (maker, taker)
        };

        out.events.push(RawEvent {
            sort_key,
            user: buyer,
            cond_idx,
            event_type: EventType::Buy,
            token_idx: outcome_idx,
            amount: token_amount,
            price,
        });
        out.events.push(RawEvent {
            sort_key,
            user: seller,
            cond_idx,
            event_type: EventType::Sell,
            token_idx: outcome_idx,
            amount: token_amount,
            price,
        });
    }
    Ok(())
}

async fn scan_converts(store: &Store, metadata: &Metadata, out: &mut ScanOutcome) -> Result<(), StoreError> {
    let rows = store.query_rows("SELECT block_number, log_index, stakeholder, market_id, index_set, amount FROM convert").await?;
    for row in rows {
        let market_id = str_field(&row, "market_id");
        let Some(cond_idx) = metadata.resolve_market(&market_id) else {
            out.unresolved += 1;
            continue;
        };

        let user = out.interner.intern(&str_field(&row, "stakeholder"));
        out.events.push(RawEvent {
            sort_key: RawEvent::linearize(i64_field(&row, "block_number"), i64_field(&row, "log_index")),
            user,
            cond_idx,
            event_type: EventType::Convert,
            token_idx: OUTCOME_ALL,
            amount: i64_field(&row, "amount"),
            price: i64_field(&row, "index_set"),
        });
    }
    Ok(())
}

async fn scan_fpmm_trades(store: &Store, metadata: &Metadata, out: &mut ScanOutcome) -> Result<(), StoreError> {
    let rows = store
        .query_rows("SELECT block_number, log_index, fpmm_addr, trader, side, outcome_index, token_amount, usdc_amount FROM fpmm_trade")
        .await?;
    for row in rows {
        let fpmm_addr = str_field(&row, "fpmm_addr");
        let Some(cond_idx) = metadata.resolve_fpmm(&fpmm_addr) else {
            out.unresolved += 1;
            continue;
        };
        if !metadata.is_within_outcome_limit(cond_idx) {
            out.outcome_limit_skipped += 1;
            continue;
        }
        let Ok(outcome_idx) = u8::try_from(i64_field(&row, "outcome_index")) else {
            out.unresolved += 1;
            continue;
        };

        let user = out.interner.intern(&str_field(&row, "trader"));
        let token_amount = i64_field(&row, "token_amount");
        let usdc_amount = i64_field(&row, "usdc_amount");
        let price = price_of(usdc_amount, token_amount);
        let event_type = if i64_field(&row, "side") == Side::Sell.as_i64() { EventType::FpmmSell } else { EventType::FpmmBuy };

        out.events.push(RawEvent {
            sort_key: RawEvent::linearize(i64_field(&row, "block_number"), i64_field(&row, "log_index")),
            user,
            cond_idx,
            event_type,
            token_idx: outcome_idx,
            amount: token_amount,
            price,
        });
    }
    Ok(())
}

async fn scan_fpmm_fundings(store: &Store, metadata: &Metadata, out: &mut ScanOutcome) -> Result<(), StoreError> {
    let rows = store
        .query_rows("SELECT block_number, log_index, fpmm_addr, funder, side, outcome0_amount, outcome1_amount FROM fpmm_funding")
        .await?;
    for row in rows {
        let fpmm_addr = str_field(&row, "fpmm_addr");
        let Some(cond_idx) = metadata.resolve_fpmm(&fpmm_addr) else {
            out.unresolved += 1;
            continue;
        };
        if !metadata.is_within_outcome_limit(cond_idx) {
            out.outcome_limit_skipped += 1;
            continue;
        }

        let user = out.interner.intern(&str_field(&row, "funder"));
        let event_type = if i64_field(&row, "side") == 1 { EventType::FpmmLpRemove } else { EventType::FpmmLpAdd };

        out.events.push(RawEvent {
            sort_key: RawEvent::linearize(i64_field(&row, "block_number"), i64_field(&row, "log_index")),
            user,
            cond_idx,
            event_type,
            token_idx: OUTCOME_ALL,
            amount: i64_field(&row, "outcome0_amount"),
            price: i64_field(&row, "outcome1_amount"),
        });
    }
    Ok(())
}

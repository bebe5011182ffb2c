//! Phase 1: interns every condition, token, FPMM pool, and neg-risk market
//! into small integer indices before the event scan starts, so Phase 2/3
//! never carry a string (spec §4.5).
//!
//! Neg-risk markets have no natural `condition_id` of their own — the
//! `neg_risk_market` table carries no link to `condition` — so each market
//! is interned as a synthetic binary condition appended after the real
//! ones, purely so `Convert` events have a `cond_idx` to bucket snapshots
//! under. It never resolves (`payout_numerators` stays `None` forever);
//! `Convert`'s accounting rule doesn't consult resolution anyway.

use std::collections::HashMap;

use serde_json::Value;

use super::types::MAX_OUTCOMES;
use crate::error::StoreError;
use crate::store::Store;

/// One `Condition` entity row, indexed by [`Metadata::condition_index`].
#[derive(Debug, Clone)]
pub struct ConditionInfo {
    pub condition_id: String,
    pub oracle: String,
    pub question_id: String,
    pub outcome_count: u8,
    pub payout_numerators: Option<Vec<i64>>,
    pub resolution_block: Option<i64>,
}

impl ConditionInfo {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.payout_numerators.is_some()
    }

    #[must_use]
    pub fn exceeds_max_outcomes(&self) -> bool {
        self.outcome_count as usize > MAX_OUTCOMES
    }
}

/// Every resolution map the scan phase needs, built once up front.
#[derive(Debug, Default)]
pub struct Metadata {
    pub conditions: Vec<ConditionInfo>,
    /// Lower-cased `condition_id` (real or synthetic market) → `cond_idx`.
    pub condition_index: HashMap<String, u32>,
    /// Lower-cased `token_id` → `(cond_idx, outcome_idx)`.
    pub token_map: HashMap<String, (u32, u8)>,
    /// Lower-cased `fpmm_addr` → `cond_idx`.
    pub fpmm_map: HashMap<String, u32>,
}

impl Metadata {
    #[must_use]
    pub fn condition(&self, cond_idx: u32) -> Option<&ConditionInfo> {
        self.conditions.get(cond_idx as usize)
    }

    #[must_use]
    pub fn cond_idx_for_condition(&self, condition_id: &str) -> Option<u32> {
        self.condition_index.get(&condition_id.to_ascii_lowercase()).copied()
    }

    #[must_use]
    pub fn resolve_token(&self, token_id: &str) -> Option<(u32, u8)> {
        self.token_map.get(&token_id.to_ascii_lowercase()).copied()
    }

    #[must_use]
    pub fn resolve_fpmm(&self, fpmm_addr: &str) -> Option<u32> {
        self.fpmm_map.get(&fpmm_addr.to_ascii_lowercase()).copied()
    }

    #[must_use]
    pub fn resolve_market(&self, market_id: &str) -> Option<u32> {
        self.condition_index.get(&market_id.to_ascii_lowercase()).copied()
    }

    /// Whether `cond_idx` is within range and has at most `MAX_OUTCOMES`
    /// outcomes.
    #[must_use]
    pub fn is_within_outcome_limit(&self, cond_idx: u32) -> bool {
        self.condition(cond_idx).is_some_and(|c| !c.exceeds_max_outcomes())
    }

    #[must_use]
    pub fn outcome_count(&self, cond_idx: u32) -> usize {
        self.condition(cond_idx).map_or(2, |c| c.outcome_count as usize).min(MAX_OUTCOMES)
    }
}

/// Loads conditions, token→condition mappings, FPMM→condition mappings,
/// and neg-risk markets (as synthetic pseudo-conditions) into one
/// [`Metadata`].
///
/// # Errors
/// Returns `StoreError::Database` on SQL failure.
pub async fn load_metadata(store: &Store) -> Result<Metadata, StoreError> {
    let mut metadata = Metadata::default();

    let condition_rows = store
        .query_rows("SELECT condition_id, oracle, question_id, outcome_slot_count, payout_numerators, resolution_block FROM condition")
        .await?;
    for row in condition_rows {
        let condition_id = str_field(&row, "condition_id");
        let payout_numerators = row
            .get("payout_numerators")
            .and_then(Value::as_str)
            .and_then(|s| serde_json::from_str::<Vec<i64>>(s).ok());
        let outcome_count = i64_field(&row, "outcome_slot_count").clamp(0, i64::from(u8::MAX)) as u8;

        let cond_idx = metadata.conditions.len() as u32;
        metadata.condition_index.insert(condition_id.to_ascii_lowercase(), cond_idx);
        metadata.conditions.push(ConditionInfo {
            condition_id,
            oracle: str_field(&row, "oracle"),
            question_id: str_field(&row, "question_id"),
            outcome_count,
            payout_numerators,
            resolution_block: row.get("resolution_block").and_then(Value::as_i64),
        });
    }

    let token_rows = store.query_rows("SELECT token_id, condition_id, is_yes FROM token_map").await?;
    for row in token_rows {
        let token_id = str_field(&row, "token_id");
        let condition_id = str_field(&row, "condition_id");
        let Some(&cond_idx) = metadata.condition_index.get(&condition_id.to_ascii_lowercase()) else { continue };
        let is_yes = i64_field(&row, "is_yes") != 0;
        metadata.token_map.insert(token_id.to_ascii_lowercase(), (cond_idx, u8::from(is_yes)));
    }

    let fpmm_rows = store.query_rows("SELECT fpmm_addr, condition_id FROM fpmm").await?;
    for row in fpmm_rows {
        let fpmm_addr = str_field(&row, "fpmm_addr");
        let condition_id = str_field(&row, "condition_id");
        let Some(&cond_idx) = metadata.condition_index.get(&condition_id.to_ascii_lowercase()) else { continue };
        metadata.fpmm_map.insert(fpmm_addr.to_ascii_lowercase(), cond_idx);
    }

    let market_rows = store.query_rows("SELECT market_id FROM neg_risk_market").await?;
    for row in market_rows {
        let market_id = str_field(&row, "market_id");
        let key = market_id.to_ascii_lowercase();
        if metadata.condition_index.contains_key(&key) {
            continue;
        }
        let cond_idx = metadata.conditions.len() as u32;
        metadata.condition_index.insert(key, cond_idx);
        metadata.conditions.push(ConditionInfo {
            condition_id: market_id,
            oracle: String::new(),
            question_id: String::new(),
            outcome_count: 2,
            payout_numerators: None,
            resolution_block: None,
        });
    }

    Ok(metadata)
}

fn str_field(row: &Value, key: &str) -> String {
    row.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn i64_field(row: &Value, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or_default()
}

//! Route handlers for the Query Server.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::{ApiError, AppError};
use crate::replay;

/// Every data table the Log Decoder writes to, in schema order. Excludes
/// `sync_state` (a single-row bookkeeping table, exposed via `/api/sync-state`).
const TABLES: &[&str] = &[
    "transfer",
    "split",
    "merge",
    "redemption",
    "condition_preparation",
    "condition",
    "condition_resolution",
    "order_filled",
    "token_map",
    "neg_risk_market",
    "neg_risk_question",
    "convert",
    "fpmm",
    "fpmm_trade",
    "fpmm_funding",
];

/// `GET /api/health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /api/tables` — row count for every data table.
pub async fn tables(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let mut counts = serde_json::Map::with_capacity(TABLES.len());
    for &table in TABLES {
        let count = state.store.count(table).await.map_err(AppError::from)?;
        counts.insert(table.to_string(), json!(count));
    }
    Ok(Json(Value::Object(counts)))
}

/// `GET /api/sync-state` — last committed block plus the live `SyncStatus`.
pub async fn sync_state(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let last_block = state.store.last_block().await.map_err(AppError::from)?;
    let status = state.status_rx.borrow().clone();
    Ok(Json(json!({ "last_block": last_block, "sync_status": status })))
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    q: String,
}

const FORBIDDEN_SUBSTRINGS: &[&str] =
    &["INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", ";", "--", "/*"];

/// `GET /api/query?q=…` — arbitrary read-only SQL against the Store. Only a
/// single `SELECT` statement is allowed; anything else is `400`.
pub async fn query(State(state): State<Arc<AppState>>, Query(params): Query<QueryParams>) -> Result<Json<Value>, ApiError> {
    let trimmed = params.q.trim();
    let upper = trimmed.to_ascii_uppercase();

    if !upper.starts_with("SELECT") {
        return Err(ApiError(AppError::InvalidQuery("only SELECT statements are allowed".into())));
    }
    if FORBIDDEN_SUBSTRINGS.iter().any(|f| upper.contains(f)) {
        return Err(ApiError(AppError::InvalidQuery("query contains a forbidden keyword or statement separator".into())));
    }

    let rows = state.store.query_rows(trimmed).await.map_err(AppError::from)?;
    Ok(Json(json!(rows)))
}

/// `POST /api/rebuild` — triggers a full replay rebuild. Rejects a second
/// concurrent rebuild with `409 Conflict` (spec §7).
pub async fn rebuild(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    if state.rebuilding.swap(true, Ordering::AcqRel) {
        return Err(ApiError(AppError::RebuildInProgress));
    }

    let result = replay::rebuild(&state.store, &state.rebuild_progress).await;
    state.rebuilding.store(false, Ordering::Release);

    let world = result.map_err(AppError::from)?;
    let built_through_block = world.built_through_block;
    let user_count = world.users.len();

    *state.world.write().await = Some(world);

    Ok(Json(json!({ "built_through_block": built_through_block, "user_count": user_count })))
}

/// `GET /api/rebuild-status` — current Replay Engine progress counters.
pub async fn rebuild_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let progress = state.rebuild_progress.borrow().clone();
    Json(json!(progress))
}

async fn world_or_err(state: &AppState) -> Result<tokio::sync::RwLockReadGuard<'_, Option<replay::World>>, ApiError> {
    let guard = state.world.read().await;
    if guard.is_none() {
        return Err(ApiError(AppError::InvalidQuery("no replay built yet; call POST /api/rebuild first".into())));
    }
    Ok(guard)
}

/// `GET /api/user/{addr}/pnl` — per-condition PnL plus totals.
pub async fn user_pnl(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(addr): axum::extract::Path<String>,
) -> Result<Json<Value>, ApiError> {
    let guard = world_or_err(&state).await?;
    let world = guard.as_ref().expect("checked above");
    let user_state = world.user_state(&addr).ok_or_else(|| ApiError(AppError::UserNotFound(addr.clone())))?;

    let conditions: Vec<Value> = user_state
        .conditions
        .iter()
        .filter_map(|cond| {
            let last = cond.snapshots.last()?;
            Some(json!({
                "cond_idx": cond.cond_idx,
                "cost_basis": last.cost_basis,
                "realized_pnl": last.realized_pnl,
            }))
        })
        .collect();
    let total_realized_pnl: i64 = conditions.iter().filter_map(|c| c["realized_pnl"].as_i64()).sum();

    Ok(Json(json!({ "address": addr, "conditions": conditions, "total_realized_pnl": total_realized_pnl })))
}

/// `GET /api/user/{addr}/positions` — active (non-zero) positions only.
pub async fn user_positions(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(addr): axum::extract::Path<String>,
) -> Result<Json<Value>, ApiError> {
    let guard = world_or_err(&state).await?;
    let world = guard.as_ref().expect("checked above");
    let user_state = world.user_state(&addr).ok_or_else(|| ApiError(AppError::UserNotFound(addr.clone())))?;

    let active: Vec<Value> = user_state
        .conditions
        .iter()
        .filter_map(|cond| {
            let last = cond.snapshots.last()?;
            if last.positions.iter().all(|&p| p == 0) {
                return None;
            }
            Some(json!({ "cond_idx": cond.cond_idx, "positions": last.positions, "cost_basis": last.cost_basis }))
        })
        .collect();

    Ok(Json(json!(active)))
}

#[derive(Debug, Deserialize)]
pub struct UserParam {
    user: String,
}

/// `GET /api/replay?user=…` — the user's full chronological timeline.
pub async fn replay_timeline(State(state): State<Arc<AppState>>, Query(q): Query<UserParam>) -> Result<Json<Value>, ApiError> {
    let guard = world_or_err(&state).await?;
    let world = guard.as_ref().expect("checked above");
    let timeline = world.user_timeline(&q.user).ok_or_else(|| ApiError(AppError::UserNotFound(q.user.clone())))?;
    Ok(Json(json!(timeline)))
}

#[derive(Debug, Deserialize)]
pub struct PositionsQuery {
    user: String,
    sk: i64,
}

/// `GET /api/replay-positions?user=…&sk=…` — positions at `sort_key`.
pub async fn replay_positions(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PositionsQuery>,
) -> Result<Json<Value>, ApiError> {
    let guard = world_or_err(&state).await?;
    let world = guard.as_ref().expect("checked above");
    if world.user_state(&q.user).is_none() {
        return Err(ApiError(AppError::UserNotFound(q.user)));
    }
    let positions = world.positions_at(&q.user, q.sk);
    Ok(Json(json!(positions)))
}

#[derive(Debug, Deserialize)]
pub struct TradesQuery {
    user: String,
    sk: i64,
    #[serde(default = "default_radius")]
    radius: usize,
}

const fn default_radius() -> usize {
    20
}

/// `GET /api/replay-trades?user=…&sk=…&radius=…` — windowed trades plus
/// the center offset within the returned window.
pub async fn replay_trades(State(state): State<Arc<AppState>>, Query(q): Query<TradesQuery>) -> Result<Json<Value>, ApiError> {
    let guard = world_or_err(&state).await?;
    let world = guard.as_ref().expect("checked above");
    if world.user_state(&q.user).is_none() {
        return Err(ApiError(AppError::UserNotFound(q.user)));
    }
    let (trades, center_offset) = world.trades_near(&q.user, q.sk, q.radius);
    Ok(Json(json!({ "trades": trades, "center_offset": center_offset })))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

const fn default_limit() -> usize {
    100
}

/// `GET /api/replay-users?limit=…` — users sorted by total event count
/// descending.
pub async fn replay_users(State(state): State<Arc<AppState>>, Query(q): Query<LimitQuery>) -> Result<Json<Value>, ApiError> {
    let guard = world_or_err(&state).await?;
    let world = guard.as_ref().expect("checked above");
    Ok(Json(json!(world.users_sorted(q.limit))))
}

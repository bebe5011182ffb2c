//! The Replay Engine: rebuilds per-user PnL state from the Store's raw
//! event tables on demand (spec §4.5). There is no incremental replay —
//! `/api/rebuild` always starts from block zero of recorded history.
//!
//! Phase 1 loads condition/token/fpmm/market metadata, Phase 2 scans every
//! raw event table into one globally time-ordered list (interning user
//! addresses as it goes, skipping rows it can't resolve), Phase 3 folds
//! that list into per-user snapshot chains on a bounded worker pool.

mod metadata;
mod progress;
mod scan;
mod types;
mod worker;

pub use self::metadata::{ConditionInfo, Metadata};
pub use self::progress::{ReplayPhase, ReplayProgress};
pub use self::types::{
    ConditionPosition, ConditionSnapshots, EventType, RawEvent, Snapshot, TimelineEntry, TradeEntry, UserState,
    UserSummary, MAX_OUTCOMES,
};

use std::collections::HashMap;

use tokio::sync::watch;

use crate::error::StoreError;
use crate::store::Store;

/// The fully replayed state of the world, rebuilt from scratch on each
/// `/api/rebuild`.
#[derive(Debug, Default)]
pub struct World {
    pub users: Vec<String>,
    pub user_index: HashMap<String, u32>,
    pub states: Vec<UserState>,
    pub built_through_block: i64,
    pub metadata: Metadata,
}

/// Rebuilds the full world from the Store's event tables, publishing
/// phase/progress updates to `progress` as it goes.
///
/// # Errors
/// Returns `StoreError::Database` on SQL failure.
pub async fn rebuild(store: &Store, progress: &watch::Sender<ReplayProgress>) -> Result<World, StoreError> {
    progress.send_replace(ReplayProgress { phase: ReplayPhase::Metadata, ..Default::default() });
    let metadata = metadata::load_metadata(store).await?;

    progress.send_modify(|p| {
        p.phase = ReplayPhase::Scan;
        p.conditions_loaded = metadata.conditions.len();
    });
    let scan::ScanOutcome { mut events, interner, unresolved, outcome_limit_skipped } =
        scan::scan_all(store, &metadata).await?;
    if unresolved > 0 {
        tracing::warn!(unresolved, "rows skipped: token/condition/fpmm/market id not resolvable in phase 1");
    }
    if outcome_limit_skipped > 0 {
        tracing::warn!(outcome_limit_skipped, "events skipped: condition exceeds MAX_OUTCOMES");
    }
    events.sort_by_key(|e| e.sort_key);

    let (users, user_index) = interner.into_parts();
    progress.send_modify(|p| {
        p.phase = ReplayPhase::Replay;
        p.events_scanned = events.len();
        p.users_total = users.len();
    });

    let mut states = worker::replay(users.len(), &events, &metadata);
    for (i, state) in states.iter_mut().enumerate() {
        state.address = users[i].clone();
    }

    let built_through_block = store.last_block().await?.unwrap_or_default();
    progress.send_modify(|p| {
        p.phase = ReplayPhase::Done;
        p.users_done = p.users_total;
        p.built_through_block = built_through_block;
    });

    Ok(World { users, user_index, states, built_through_block, metadata })
}

impl World {
    #[must_use]
    pub fn user_state(&self, address: &str) -> Option<&UserState> {
        let id = *self.user_index.get(&address.to_ascii_lowercase())?;
        self.states.get(id as usize)
    }

    /// `/api/replay?user=…` — the user's full chronological timeline.
    #[must_use]
    pub fn user_timeline(&self, address: &str) -> Option<&[TimelineEntry]> {
        self.user_state(address).map(|s| s.timeline.as_slice())
    }

    /// `/api/replay-positions?user=…&sk=…` — each condition's position as
    /// of `sort_key`: the latest snapshot with `snapshot.sort_key <=
    /// sort_key`, per condition the user ever touched. Omits conditions
    /// left entirely at zero.
    #[must_use]
    pub fn positions_at(&self, address: &str, sort_key: i64) -> Vec<ConditionPosition> {
        let Some(state) = self.user_state(address) else { return Vec::new() };

        state
            .conditions
            .iter()
            .filter_map(|cond| {
                let idx = cond.snapshots.partition_point(|s| s.sort_key <= sort_key);
                let snapshot = idx.checked_sub(1).and_then(|i| cond.snapshots.get(i))?;
                if snapshot.positions.iter().all(|&p| p == 0) && snapshot.realized_pnl == 0 {
                    return None;
                }
                let info = self.metadata.condition(cond.cond_idx);
                Some(ConditionPosition {
                    cond_idx: cond.cond_idx,
                    condition_id: info.map(|c| c.condition_id.clone()).unwrap_or_default(),
                    positions: snapshot.positions.clone(),
                    cost_basis: snapshot.cost_basis,
                    realized_pnl: snapshot.realized_pnl,
                    resolved: info.is_some_and(ConditionInfo::is_resolved),
                    payout_numerators: info.and_then(|c| c.payout_numerators.clone()),
                })
            })
            .collect()
    }

    /// `/api/replay-trades?user=…&sk=…&radius=…` — `radius` trade events
    /// on either side of the first trade with `sort_key >= sk`, plus the
    /// index of that trade within the returned slice.
    #[must_use]
    pub fn trades_near(&self, address: &str, sort_key: i64, radius: usize) -> (Vec<TradeEntry>, usize) {
        let Some(state) = self.user_state(address) else { return (Vec::new(), 0) };

        let trades: Vec<&TimelineEntry> = state.timeline.iter().filter(|e| e.event_type.is_trade()).collect();
        if trades.is_empty() {
            return (Vec::new(), 0);
        }

        let center = trades.partition_point(|e| e.sort_key < sort_key).min(trades.len() - 1);
        let start = center.saturating_sub(radius);
        let end = (center + radius + 1).min(trades.len());

        let entries = trades[start..end]
            .iter()
            .map(|e| TradeEntry {
                sort_key: e.sort_key,
                event_type: e.event_type,
                cond_idx: e.cond_idx,
                token_idx: e.token_idx,
                amount: e.delta,
                price: e.price,
            })
            .collect();
        (entries, center - start)
    }

    /// `/api/replay-users?limit=…` — all users sorted by total event count
    /// descending.
    #[must_use]
    pub fn users_sorted(&self, limit: usize) -> Vec<UserSummary> {
        let mut summaries: Vec<UserSummary> =
            self.states.iter().map(|s| UserSummary { address: s.address.clone(), event_count: s.event_count }).collect();
        summaries.sort_by(|a, b| b.event_count.cmp(&a.event_count));
        summaries.truncate(limit);
        summaries
    }
}

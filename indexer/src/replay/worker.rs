//! Phase 3: fold each user's event history into a [`UserState`] (spec §4.5
//! accounting rules).
//!
//! Events are bucketed by user first (each `RawEvent` already belongs to
//! exactly one user — a trade's two legs are two separate events from
//! Phase 2), then a bounded rayon thread pool processes each user's bucket
//! independently. This is the parallel counterpart to the original's
//! atomic-counter worker loop over a fixed OS-thread pool, without
//! resorting to unsafe aliasing of a shared `&mut [UserState]` (this
//! workspace forbids `unsafe_code`).

use rayon::prelude::*;

use super::metadata::Metadata;
use super::types::{
    ConditionSnapshots, EventType, RawEvent, ReplayState, Snapshot, TimelineEntry, UserState, MAX_OUTCOMES,
};

const MAX_WORKERS: usize = 16;
const MICRO: i64 = 1_000_000;

/// Applies one event to `state` in place. `outcome_count` and
/// `payout_numerators` come from the event's condition metadata.
fn apply(state: &mut ReplayState, event: &RawEvent, outcome_count: usize, payout_numerators: Option<&[i64]>) {
    match event.event_type {
        EventType::Buy | EventType::FpmmBuy => {
            let i = event.token_idx as usize;
            if i >= MAX_OUTCOMES {
                return;
            }
            state.cost[i] += event.amount * event.price;
            state.positions[i] += event.amount;
        }
        EventType::Sell | EventType::FpmmSell => {
            let i = event.token_idx as usize;
            if i >= MAX_OUTCOMES {
                return;
            }
            sell_outcome(state, i, event.amount, event.price);
        }
        EventType::Split => {
            let implied_price = MICRO / outcome_count as i64;
            for i in 0..outcome_count {
                state.cost[i] += event.amount * implied_price;
                state.positions[i] += event.amount;
            }
        }
        EventType::Merge => {
            let implied_price = MICRO / outcome_count as i64;
            for i in 0..outcome_count {
                sell_outcome(state, i, event.amount, implied_price);
            }
        }
        EventType::Redemption => {
            let Some(numerators) = payout_numerators else { return };
            for i in 0..outcome_count {
                if event.token_idx & (1 << i) == 0 {
                    continue;
                }
                let Some(&payout_rate) = numerators.get(i) else { continue };
                state.realized_pnl += (state.positions[i] * payout_rate - state.cost[i]) / MICRO;
                state.positions[i] = 0;
                state.cost[i] = 0;
            }
        }
        EventType::FpmmLpAdd => {
            let (amount0, amount1) = (event.amount, event.price);
            let total = amount0 + amount1;
            if total == 0 {
                return;
            }
            for (i, outcome_amount) in [amount0, amount1].into_iter().enumerate() {
                let implied_price = outcome_amount * MICRO / total;
                state.cost[i] += outcome_amount * implied_price;
                state.positions[i] += outcome_amount;
            }
        }
        EventType::FpmmLpRemove => {
            let (amount0, amount1) = (event.amount, event.price);
            let total = amount0 + amount1;
            if total == 0 {
                return;
            }
            for (i, outcome_amount) in [amount0, amount1].into_iter().enumerate() {
                let implied_price = outcome_amount * MICRO / total;
                sell_outcome(state, i, outcome_amount, implied_price);
            }
        }
        EventType::Convert => {
            // `price` carries the index set for Convert events.
            let popcount = i64::from((event.price as u32).count_ones());
            if popcount > 1 {
                state.realized_pnl += (popcount - 1) * event.amount;
            }
        }
        EventType::TransferIn => {
            let i = event.token_idx as usize;
            if i < MAX_OUTCOMES {
                state.positions[i] += event.amount;
            }
        }
        EventType::TransferOut => {
            let i = event.token_idx as usize;
            if i >= MAX_OUTCOMES {
                return;
            }
            let pos = state.positions[i];
            if pos <= 0 {
                return;
            }
            let actual = event.amount.min(pos);
            let cost_removed = state.cost[i] * actual / pos;
            state.cost[i] -= cost_removed;
            state.positions[i] -= actual;
        }
    }
}

/// Disposes of up to `qty` units of outcome `i` at `price`, realizing
/// proportional cost basis. Clamps to what is actually held so an
/// ordering or decode gap never drives a position negative.
fn sell_outcome(state: &mut ReplayState, i: usize, qty: i64, price: i64) {
    let pos = state.positions[i];
    if pos <= 0 {
        return;
    }
    let sold = qty.min(pos);
    let cost_removed = state.cost[i] * sold / pos;
    state.realized_pnl += (sold * price - cost_removed) / MICRO;
    state.cost[i] -= cost_removed;
    state.positions[i] -= sold;
}

/// Folds one user's sorted event slice into its snapshot chains, flat
/// timeline, and total event count.
fn fold_user(events: &mut [RawEvent], metadata: &Metadata) -> (Vec<ConditionSnapshots>, Vec<TimelineEntry>, u64) {
    events.sort_by_key(|e| e.sort_key);

    let mut cond_state: std::collections::HashMap<u32, ReplayState> = std::collections::HashMap::new();
    let mut cond_order: Vec<u32> = Vec::new();
    let mut chains: std::collections::HashMap<u32, Vec<Snapshot>> = std::collections::HashMap::new();
    let mut timeline = Vec::with_capacity(events.len());
    let mut held: std::collections::HashSet<(u32, u8)> = std::collections::HashSet::new();

    for event in events.iter() {
        let outcome_count = metadata.outcome_count(event.cond_idx);
        let numerators = metadata.condition(event.cond_idx).and_then(|c| c.payout_numerators.as_deref());

        let state = cond_state.entry(event.cond_idx).or_insert_with(|| {
            cond_order.push(event.cond_idx);
            ReplayState::default()
        });
        apply(state, event, outcome_count, numerators);

        for i in 0..outcome_count {
            if state.positions[i] > 0 {
                held.insert((event.cond_idx, i as u8));
            }
        }

        let snapshot = Snapshot {
            sort_key: event.sort_key,
            delta: event.amount,
            price: event.price,
            positions: state.positions[..outcome_count].to_vec(),
            cost_basis: state.cost[..outcome_count].iter().sum(),
            realized_pnl: state.realized_pnl,
            event_type: event.event_type,
            token_idx: event.token_idx,
            outcome_count: outcome_count as u8,
        };
        chains.entry(event.cond_idx).or_default().push(snapshot);

        timeline.push(TimelineEntry {
            sort_key: event.sort_key,
            event_type: event.event_type,
            realized_pnl_at_event: state.realized_pnl,
            delta: event.amount,
            price: event.price,
            cond_idx: event.cond_idx,
            token_idx: event.token_idx,
            cumulative_distinct_tokens_held: held.len() as u64,
        });
    }

    let conditions = cond_order
        .into_iter()
        .map(|cond_idx| ConditionSnapshots { cond_idx, snapshots: chains.remove(&cond_idx).unwrap_or_default() })
        .collect();
    let event_count = events.len() as u64;
    (conditions, timeline, event_count)
}

/// Partitions `events` by user, then replays each user's bucket on a
/// bounded rayon thread pool (capped at [`MAX_WORKERS`]).
#[must_use]
pub fn replay(user_count: usize, events: &[RawEvent], metadata: &Metadata) -> Vec<UserState> {
    let mut buckets: Vec<Vec<RawEvent>> = (0..user_count).map(|_| Vec::new()).collect();
    for event in events {
        if let Some(bucket) = buckets.get_mut(event.user as usize) {
            bucket.push(event.clone());
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(MAX_WORKERS.min(rayon::current_num_threads()))
        .build()
        .unwrap_or_else(|_| rayon::ThreadPoolBuilder::new().build().expect("default rayon pool"));

    pool.install(|| {
        buckets
            .into_par_iter()
            .map(|mut bucket| {
                let (conditions, timeline, event_count) = fold_user(&mut bucket, metadata);
                UserState { address: String::new(), conditions, timeline, event_count }
            })
            .collect::<Vec<_>>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::metadata::ConditionInfo;

    fn metadata_with_condition(outcome_count: u8, payout_numerators: Option<Vec<i64>>) -> Metadata {
        let mut metadata = Metadata::default();
        metadata.condition_index.insert("0xc".into(), 0);
        metadata.conditions.push(ConditionInfo {
            condition_id: "0xc".into(),
            oracle: String::new(),
            question_id: String::new(),
            outcome_count,
            payout_numerators,
            resolution_block: None,
        });
        metadata
    }

    fn event(sort_key: i64, user: u32, event_type: EventType, token_idx: u8, amount: i64, price: i64) -> RawEvent {
        RawEvent { sort_key, user, cond_idx: 0, event_type, token_idx, amount, price }
    }

    #[test]
    fn buy_then_sell_at_profit() {
        let metadata = metadata_with_condition(2, None);
        let events =
            vec![event(1, 0, EventType::Buy, 0, 10_000_000, 500_000), event(2, 0, EventType::Sell, 0, 10_000_000, 700_000)];
        let states = replay(1, &events, &metadata);
        let snap = &states[0].conditions[0].snapshots;
        let last = snap.last().unwrap();
        assert_eq!(last.positions[0], 0);
        assert_eq!(last.cost_basis, 0);
        assert_eq!(last.realized_pnl, 2_000_000);
    }

    #[test]
    fn partial_sell() {
        let metadata = metadata_with_condition(2, None);
        let events =
            vec![event(1, 0, EventType::Buy, 0, 10_000_000, 500_000), event(2, 0, EventType::Sell, 0, 4_000_000, 800_000)];
        let states = replay(1, &events, &metadata);
        let last = states[0].conditions[0].snapshots.last().unwrap();
        assert_eq!(last.positions[0], 6_000_000);
        assert_eq!(last.cost_basis, 3_000_000_000_000);
        assert_eq!(last.realized_pnl, 1_200_000);
    }

    #[test]
    fn split_then_merge_round_trip() {
        let metadata = metadata_with_condition(2, None);
        let events = vec![event(1, 0, EventType::Split, u8::MAX, 5_000_000, 0), event(2, 0, EventType::Merge, u8::MAX, 5_000_000, 0)];
        let states = replay(1, &events, &metadata);
        let last = states[0].conditions[0].snapshots.last().unwrap();
        assert_eq!(last.positions, vec![0, 0]);
        assert_eq!(last.cost_basis, 0);
        assert_eq!(last.realized_pnl, 0);
    }

    #[test]
    fn redemption_of_winning_outcome_matches_implemented_formula() {
        let metadata = metadata_with_condition(2, Some(vec![1_000_000, 0]));
        let events =
            vec![event(1, 0, EventType::Buy, 0, 10_000_000, 400_000), event(2, 0, EventType::Redemption, 0b01, 0, 0)];
        let states = replay(1, &events, &metadata);
        let last = states[0].conditions[0].snapshots.last().unwrap();
        // Contract-locking: positions[0]*payout_numerator[0]/MICRO is the
        // redeemed payout; cost[0]/MICRO is the cost basis it replaces.
        assert_eq!(last.positions[0], 0);
        assert_eq!(last.realized_pnl, 6_000_000);
    }

    #[test]
    fn convert_credits_popcount_minus_one_times_amount() {
        let metadata = metadata_with_condition(4, None);
        let events = vec![event(1, 0, EventType::Convert, u8::MAX, 1_000_000, 0b0111)];
        let states = replay(1, &events, &metadata);
        let last = states[0].conditions[0].snapshots.last().unwrap();
        assert_eq!(last.realized_pnl, 2_000_000);
    }

    #[test]
    fn fpmm_lp_add_then_remove_splits_cost_by_implied_price() {
        let metadata = metadata_with_condition(2, None);
        let events = vec![
            event(1, 0, EventType::FpmmLpAdd, u8::MAX, 6_000_000, 4_000_000),
            event(2, 0, EventType::FpmmLpRemove, u8::MAX, 6_000_000, 4_000_000),
        ];
        let states = replay(1, &events, &metadata);
        let last = states[0].conditions[0].snapshots.last().unwrap();
        assert_eq!(last.positions, vec![0, 0]);
        assert_eq!(last.realized_pnl, 0);
    }
}

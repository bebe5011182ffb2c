//! Data model for the Replay Engine (spec §4.5).
//!
//! A [`RawEvent`] is the normalized, fully-resolved unit Phase 2 produces:
//! every id (condition, token, fpmm pool) has already been interned to a
//! small integer by Phase 1, so Phase 3 never touches a string. Positions
//! and cost basis are tracked per `(user, condition)` rather than per
//! opaque instrument, in fixed-size `[i64; MAX_OUTCOMES]` arrays — a
//! condition with more outcomes than that is out of scope (see
//! `MAX_OUTCOMES`) and its events are dropped before they reach a worker.

use serde::Serialize;

/// A condition with more outcomes than this is skipped entirely: its
/// events are counted but never applied, and it never accumulates a
/// position array. Every FPMM pool in this protocol is binary (2
/// outcomes), so this only bites multi-outcome neg-risk-style conditions.
pub const MAX_OUTCOMES: usize = 8;

/// Sentinel `token_idx` meaning "applies to every outcome of the
/// condition", used by Split/Merge/Convert/FPMM funding events rather than
/// a single outcome index.
pub const OUTCOME_ALL: u8 = u8::MAX;

/// The twelve ways a [`RawEvent`] can move a user's position/cost/PnL
/// (spec §4.5 accounting rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Buy,
    Sell,
    Split,
    Merge,
    Redemption,
    FpmmBuy,
    FpmmSell,
    FpmmLpAdd,
    FpmmLpRemove,
    Convert,
    TransferIn,
    TransferOut,
}

impl EventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Split => "split",
            Self::Merge => "merge",
            Self::Redemption => "redemption",
            Self::FpmmBuy => "fpmm_buy",
            Self::FpmmSell => "fpmm_sell",
            Self::FpmmLpAdd => "fpmm_lp_add",
            Self::FpmmLpRemove => "fpmm_lp_remove",
            Self::Convert => "convert",
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
        }
    }

    /// Whether this event type belongs in a `trades_near` window.
    #[must_use]
    pub const fn is_trade(self) -> bool {
        matches!(self, Self::Buy | Self::Sell | Self::FpmmBuy | Self::FpmmSell)
    }
}

/// One resolved, user-scoped event ready for Phase 3. `sort_key` linearizes
/// `(block_number, log_index)` into a single monotonically increasing
/// integer (see [`RawEvent::linearize`]).
///
/// `token_idx` and `price` are overloaded per event type, mirroring the
/// fixed-width record the original engine streams per event:
///
/// | event type                 | token_idx         | amount        | price             |
/// |-----------------------------|--------------------|---------------|--------------------|
/// | Buy / Sell / FpmmBuy/Sell    | outcome index        | token amount   | μUSDC per token    |
/// | Split / Merge                | `OUTCOME_ALL`        | basket amount  | unused (0)         |
/// | Redemption                    | index set bitmask    | payout         | unused (0)         |
/// | FpmmLpAdd / FpmmLpRemove      | `OUTCOME_ALL`        | amount0        | amount1            |
/// | Convert                        | `OUTCOME_ALL`        | amount         | index set          |
/// | TransferIn / TransferOut        | outcome index        | amount         | unused (0)         |
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub sort_key: i64,
    pub user: u32,
    pub cond_idx: u32,
    pub event_type: EventType,
    pub token_idx: u8,
    pub amount: i64,
    pub price: i64,
}

impl RawEvent {
    /// Combines `(block_number, log_index)` into one monotonic integer.
    /// The multiplier is comfortably larger than any log index a single
    /// block can produce, even after `TransferBatch` expansion
    /// (`original_log_index * 1000 + i`).
    #[must_use]
    pub const fn linearize(block_number: i64, log_index: i64) -> i64 {
        block_number * 1_000_000_000 + log_index
    }
}

/// Running positions/cost-basis/realized-PnL for one `(user, condition)`
/// pair, rebuilt from scratch at the start of each replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayState {
    pub positions: [i64; MAX_OUTCOMES],
    pub cost: [i64; MAX_OUTCOMES],
    pub realized_pnl: i64,
}

/// A point-in-time snapshot of one `(user, condition)` pair, appended
/// after every event that touches it. `positions`/`cost_basis` are
/// truncated to the condition's actual `outcome_count`.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub sort_key: i64,
    pub delta: i64,
    pub price: i64,
    pub positions: Vec<i64>,
    pub cost_basis: i64,
    pub realized_pnl: i64,
    pub event_type: EventType,
    pub token_idx: u8,
    pub outcome_count: u8,
}

/// The full snapshot chain for one condition, in event order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConditionSnapshots {
    pub cond_idx: u32,
    pub snapshots: Vec<Snapshot>,
}

/// One entry in a user's flat, cross-condition event timeline.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub sort_key: i64,
    pub event_type: EventType,
    pub realized_pnl_at_event: i64,
    pub delta: i64,
    pub price: i64,
    pub cond_idx: u32,
    pub token_idx: u8,
    pub cumulative_distinct_tokens_held: u64,
}

/// A trade-only entry, returned by `trades_near`.
#[derive(Debug, Clone, Serialize)]
pub struct TradeEntry {
    pub sort_key: i64,
    pub event_type: EventType,
    pub cond_idx: u32,
    pub token_idx: u8,
    pub amount: i64,
    pub price: i64,
}

/// One user's fully replayed state: a snapshot chain per condition it ever
/// touched, plus the flat chronological timeline across all of them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserState {
    pub address: String,
    pub conditions: Vec<ConditionSnapshots>,
    pub timeline: Vec<TimelineEntry>,
    pub event_count: u64,
}

/// Per-condition position as of some `sort_key`, returned by `positions_at`.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionPosition {
    pub cond_idx: u32,
    pub condition_id: String,
    pub positions: Vec<i64>,
    pub cost_basis: i64,
    pub realized_pnl: i64,
    pub resolved: bool,
    pub payout_numerators: Option<Vec<i64>>,
}

/// One leaderboard row, returned by `users_sorted`.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub address: String,
    pub event_count: u64,
}

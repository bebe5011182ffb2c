//! Typed row structs produced by the decoder, and the [`ParsedEvents`]
//! bundle the Sync Coordinator hands to the Store in one write transaction.
//!
//! The original accumulates pre-formatted SQL strings; here each event
//! family gets a plain struct and the Store binds them as query parameters.
//! Same semantics, no string-built SQL.

/// Side of an order fill, derived from `maker_asset_id == 0` (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Maker sold the collateral asset (asset id 0) for the outcome token.
    Buy,
    /// Maker sold the outcome token for collateral.
    Sell,
}

impl Side {
    /// Integer encoding stored in SQL (`0` = Buy, `1` = Sell).
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferRow {
    pub block_number: i64,
    pub log_index: i64,
    pub from_addr: String,
    pub to_addr: String,
    pub token_id: String,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct SplitRow {
    pub block_number: i64,
    pub log_index: i64,
    pub stakeholder: String,
    pub condition_id: String,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct MergeRow {
    pub block_number: i64,
    pub log_index: i64,
    pub stakeholder: String,
    pub condition_id: String,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct RedemptionRow {
    pub block_number: i64,
    pub log_index: i64,
    pub redeemer: String,
    pub condition_id: String,
    pub index_sets: i64,
    pub payout: i64,
}

#[derive(Debug, Clone)]
pub struct ConditionPreparationRow {
    pub block_number: i64,
    pub log_index: i64,
    pub condition_id: String,
    pub oracle: String,
    pub question_id: String,
    pub outcome_slot_count: i64,
}

#[derive(Debug, Clone)]
pub struct ConditionResolutionRow {
    pub block_number: i64,
    pub log_index: i64,
    pub condition_id: String,
    pub payout_numerators: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct OrderFilledRow {
    pub block_number: i64,
    pub log_index: i64,
    pub exchange: String,
    pub maker: String,
    pub taker: String,
    pub token_id: String,
    pub side: Side,
    pub usdc_amount: i64,
    pub token_amount: i64,
    pub fee: i64,
}

#[derive(Debug, Clone)]
pub struct TokenRegisteredRow {
    pub block_number: i64,
    pub log_index: i64,
    pub token_id: String,
    pub complement_token_id: String,
    pub condition_id: String,
    pub is_yes: bool,
}

#[derive(Debug, Clone)]
pub struct PositionsConvertedRow {
    pub block_number: i64,
    pub log_index: i64,
    pub stakeholder: String,
    pub market_id: String,
    pub index_set: i64,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct MarketPreparedRow {
    pub block_number: i64,
    pub log_index: i64,
    pub market_id: String,
    pub oracle: String,
    pub fee_bips: i64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct QuestionPreparedRow {
    pub block_number: i64,
    pub log_index: i64,
    pub question_id: String,
    pub market_id: String,
    pub question_index: i64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FpmmCreationRow {
    pub block_number: i64,
    pub log_index: i64,
    pub fpmm_addr: String,
    pub condition_id: String,
    pub collateral_token: String,
    pub fee: i64,
}

#[derive(Debug, Clone)]
pub struct FpmmTradeRow {
    pub block_number: i64,
    pub log_index: i64,
    pub fpmm_addr: String,
    pub trader: String,
    pub side: Side,
    pub outcome_index: i64,
    pub token_amount: i64,
    pub usdc_amount: i64,
}

#[derive(Debug, Clone)]
pub struct FpmmFundingRow {
    pub block_number: i64,
    pub log_index: i64,
    pub fpmm_addr: String,
    pub funder: String,
    /// `0` = funding added, `1` = funding removed.
    pub side: i64,
    /// Contribution/withdrawal amount for outcome 0, from `amountsAdded`/`amountsRemoved[0]`.
    pub outcome0_amount: i64,
    /// Contribution/withdrawal amount for outcome 1, from `amountsAdded`/`amountsRemoved[1]`.
    pub outcome1_amount: i64,
    pub shares_amount: i64,
}

/// Everything the decoder extracted from one `eth_getLogs` batch, grouped by
/// destination table. The Store consumes this in a single write transaction
/// (spec §4.3 invariant 1: all-or-nothing per batch).
#[derive(Debug, Clone, Default)]
pub struct ParsedEvents {
    pub transfers: Vec<TransferRow>,
    pub splits: Vec<SplitRow>,
    pub merges: Vec<MergeRow>,
    pub redemptions: Vec<RedemptionRow>,
    pub condition_preparations: Vec<ConditionPreparationRow>,
    pub condition_resolutions: Vec<ConditionResolutionRow>,
    pub order_fills: Vec<OrderFilledRow>,
    pub token_registrations: Vec<TokenRegisteredRow>,
    pub positions_converted: Vec<PositionsConvertedRow>,
    pub markets_prepared: Vec<MarketPreparedRow>,
    pub questions_prepared: Vec<QuestionPreparedRow>,
    pub fpmm_creations: Vec<FpmmCreationRow>,
    pub fpmm_trades: Vec<FpmmTradeRow>,
    pub fpmm_fundings: Vec<FpmmFundingRow>,
}

impl ParsedEvents {
    /// Total row count across every family, used for logging and for the
    /// Sync Coordinator's throughput estimator.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.transfers.len()
            + self.splits.len()
            + self.merges.len()
            + self.redemptions.len()
            + self.condition_preparations.len()
            + self.condition_resolutions.len()
            + self.order_fills.len()
            + self.token_registrations.len()
            + self.positions_converted.len()
            + self.markets_prepared.len()
            + self.questions_prepared.len()
            + self.fpmm_creations.len()
            + self.fpmm_trades.len()
            + self.fpmm_fundings.len()
    }

    /// Merges `other` into `self`, preserving relative order within each
    /// family (batches are decoded in ascending block order).
    pub fn extend(&mut self, other: Self) {
        self.transfers.extend(other.transfers);
        self.splits.extend(other.splits);
        self.merges.extend(other.merges);
        self.redemptions.extend(other.redemptions);
        self.condition_preparations.extend(other.condition_preparations);
        self.condition_resolutions.extend(other.condition_resolutions);
        self.order_fills.extend(other.order_fills);
        self.token_registrations.extend(other.token_registrations);
        self.positions_converted.extend(other.positions_converted);
        self.markets_prepared.extend(other.markets_prepared);
        self.questions_prepared.extend(other.questions_prepared);
        self.fpmm_creations.extend(other.fpmm_creations);
        self.fpmm_trades.extend(other.fpmm_trades);
        self.fpmm_fundings.extend(other.fpmm_fundings);
    }
}

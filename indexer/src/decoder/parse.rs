//! Per-event field extraction. Each function takes one [`RawLog`] and
//! returns the row(s) it produces, or `None` when the log is filtered out
//! (mint/burn legs already covered by Split/Merge/Redemption, or
//! exchange-mediated transfers already covered by `OrderFilled`).

use rpc_client::RawLog;

use super::primitives::{address_from_topic, bytes32_word, dynamic_array, dynamic_bytes, is_zero_address, uint256_word};
use crate::decoder::contracts::is_exchange;
use crate::decoder::rows::{
    ConditionPreparationRow, ConditionResolutionRow, FpmmCreationRow, FpmmFundingRow, FpmmTradeRow, MarketPreparedRow,
    MergeRow, OrderFilledRow, PositionsConvertedRow, QuestionPreparedRow, RedemptionRow, Side, SplitRow, TokenRegisteredRow,
    TransferRow,
};
use crate::error::DecodeError;

fn require_topics(event: &'static str, log: &RawLog, want: usize) -> Result<(), DecodeError> {
    if log.topics.len() != want {
        return Err(DecodeError::TopicCount { event, got: log.topics.len(), want });
    }
    Ok(())
}

/// Reads one element of an already-extracted dynamic array as a `uint256`
/// truncated to `i64`, the same way [`uint256_word`] reads a fixed word.
fn array_element(event: &'static str, words: &[String], index: usize) -> Result<i64, DecodeError> {
    let word = words.get(index).ok_or_else(|| DecodeError::DataLength {
        event,
        detail: format!("array element {index} missing"),
    })?;
    i64::from_str_radix(&word[48..64], 16)
        .map_err(|e| DecodeError::DataLength { event, detail: format!("array element {index} not valid hex: {e}") })
}

/// `TransferSingle(operator,from,to,id,value)`. Filtered out when the
/// operator is an exchange (already recorded via `OrderFilled`) or when
/// either leg is the zero address (already recorded via Split/Merge/
/// Redemption).
pub fn transfer_single(log: &RawLog) -> Result<Option<TransferRow>, DecodeError> {
    const EVENT: &str = "TransferSingle";
    require_topics(EVENT, log, 4)?;

    let operator = address_from_topic(&log.topics[1]);
    let from_addr = address_from_topic(&log.topics[2]);
    let to_addr = address_from_topic(&log.topics[3]);

    if is_exchange(&operator) || is_zero_address(&from_addr) || is_zero_address(&to_addr) {
        return Ok(None);
    }

    let token_id = bytes32_word(EVENT, &log.data, 0)?;
    let amount = uint256_word(EVENT, &log.data, 1)?;

    Ok(Some(TransferRow {
        block_number: log.block_number,
        log_index: log.log_index,
        from_addr,
        to_addr,
        token_id,
        amount,
    }))
}

/// `TransferBatch(operator,from,to,ids[],values[])`. Each element becomes
/// its own row; `log_index` is expanded to `original * 1000 + i` so every
/// element keeps a unique, order-preserving key within the batch.
pub fn transfer_batch(log: &RawLog) -> Result<Vec<TransferRow>, DecodeError> {
    const EVENT: &str = "TransferBatch";
    require_topics(EVENT, log, 4)?;

    let operator = address_from_topic(&log.topics[1]);
    let from_addr = address_from_topic(&log.topics[2]);
    let to_addr = address_from_topic(&log.topics[3]);

    if is_exchange(&operator) || is_zero_address(&from_addr) || is_zero_address(&to_addr) {
        return Ok(Vec::new());
    }

    let ids = dynamic_array(EVENT, &log.data, 0)?;
    let values = dynamic_array(EVENT, &log.data, 1)?;
    if ids.len() != values.len() {
        return Err(DecodeError::DataLength {
            event: EVENT,
            detail: format!("ids/values length mismatch: {} vs {}", ids.len(), values.len()),
        });
    }

    ids.iter()
        .zip(values.iter())
        .enumerate()
        .map(|(i, (id, value))| {
            let amount = i64::from_str_radix(&value[48..64], 16)
                .map_err(|e| DecodeError::DataLength { event: EVENT, detail: e.to_string() })?;
            Ok(TransferRow {
                block_number: log.block_number,
                log_index: log.log_index * 1000 + i as i64,
                from_addr: from_addr.clone(),
                to_addr: to_addr.clone(),
                token_id: format!("0x{id}"),
                amount,
            })
        })
        .collect()
}

/// `PositionSplit(stakeholder,collateralToken,parentCollectionId,conditionId,partition[],amount)`.
pub fn position_split(log: &RawLog) -> Result<SplitRow, DecodeError> {
    const EVENT: &str = "PositionSplit";
    require_topics(EVENT, log, 2)?;

    let stakeholder = address_from_topic(&log.topics[1]);
    let condition_id = bytes32_word(EVENT, &log.data, 1)?;
    let amount = uint256_word(EVENT, &log.data, 3)?;

    Ok(SplitRow { block_number: log.block_number, log_index: log.log_index, stakeholder, condition_id, amount })
}

/// `PositionsMerge(stakeholder,collateralToken,parentCollectionId,conditionId,partition[],amount)`.
pub fn positions_merge(log: &RawLog) -> Result<MergeRow, DecodeError> {
    const EVENT: &str = "PositionsMerge";
    require_topics(EVENT, log, 2)?;

    let stakeholder = address_from_topic(&log.topics[1]);
    let condition_id = bytes32_word(EVENT, &log.data, 1)?;
    let amount = uint256_word(EVENT, &log.data, 3)?;

    Ok(MergeRow { block_number: log.block_number, log_index: log.log_index, stakeholder, condition_id, amount })
}

/// `PayoutRedemption(redeemer,collateralToken,parentCollectionId,conditionId,indexSets[],payout)`.
/// `index_sets` is stored as the bitwise-OR reduction of the index-set
/// array, matching the replay engine's use of it as a membership mask.
pub fn payout_redemption(log: &RawLog) -> Result<RedemptionRow, DecodeError> {
    const EVENT: &str = "PayoutRedemption";
    require_topics(EVENT, log, 2)?;

    let redeemer = address_from_topic(&log.topics[1]);
    let condition_id = bytes32_word(EVENT, &log.data, 1)?;
    let index_set_words = dynamic_array(EVENT, &log.data, 2)?;
    let payout = uint256_word(EVENT, &log.data, 3)?;

    let mut index_sets = 0i64;
    for word in &index_set_words {
        let v = i64::from_str_radix(&word[48..64], 16)
            .map_err(|e| DecodeError::DataLength { event: EVENT, detail: e.to_string() })?;
        index_sets |= v;
    }

    Ok(RedemptionRow { block_number: log.block_number, log_index: log.log_index, redeemer, condition_id, index_sets, payout })
}

/// `ConditionPreparation(conditionId,oracle,questionId,outcomeSlotCount)`.
/// Creates the `Condition` entity row with `payout_numerators = NULL`.
pub fn condition_preparation(log: &RawLog) -> Result<ConditionPreparationRow, DecodeError> {
    const EVENT: &str = "ConditionPreparation";
    require_topics(EVENT, log, 4)?;

    let condition_id = log.topics[1].to_ascii_lowercase();
    let oracle = address_from_topic(&log.topics[2]);
    let question_id = log.topics[3].to_ascii_lowercase();
    let outcome_slot_count = uint256_word(EVENT, &log.data, 0)?;

    Ok(ConditionPreparationRow {
        block_number: log.block_number,
        log_index: log.log_index,
        condition_id,
        oracle,
        question_id,
        outcome_slot_count,
    })
}

/// `ConditionResolution(conditionId,oracle,questionId,outcomeSlotCount,payoutNumerators[])`.
/// Unlike the original's string-join-then-reparse, `payout_numerators` is
/// decoded directly into a `Vec<i64>`.
pub fn condition_resolution(log: &RawLog) -> Result<ConditionResolutionRow, DecodeError> {
    const EVENT: &str = "ConditionResolution";
    require_topics(EVENT, log, 4)?;

    let condition_id = log.topics[1].to_ascii_lowercase();
    let words = dynamic_array(EVENT, &log.data, 1)?;
    let payout_numerators = words
        .iter()
        .map(|w| i64::from_str_radix(&w[48..64], 16).map_err(|e| DecodeError::DataLength { event: EVENT, detail: e.to_string() }))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ConditionResolutionRow { block_number: log.block_number, log_index: log.log_index, condition_id, payout_numerators })
}

/// `OrderFilled(orderHash,maker,taker,makerAssetId,takerAssetId,makerAmountFilled,takerAmountFilled,fee)`.
/// `maker_asset_id == 0` (collateral) means the maker was buying the
/// outcome token, i.e. this fill is a Buy from the maker's perspective.
pub fn order_filled(log: &RawLog, exchange: &str) -> Result<OrderFilledRow, DecodeError> {
    const EVENT: &str = "OrderFilled";
    require_topics(EVENT, log, 3)?;

    let maker = address_from_topic(&log.topics[1]);
    let taker = address_from_topic(&log.topics[2]);

    let maker_asset_id = bytes32_word(EVENT, &log.data, 0)?;
    let taker_asset_id = bytes32_word(EVENT, &log.data, 1)?;
    let maker_amount = uint256_word(EVENT, &log.data, 2)?;
    let taker_amount = uint256_word(EVENT, &log.data, 3)?;
    let fee = uint256_word(EVENT, &log.data, 4)?;

    let maker_is_collateral = is_zero_address(&maker_asset_id);
    let (side, token_id, usdc_amount, token_amount) = if maker_is_collateral {
        (Side::Buy, taker_asset_id, maker_amount, taker_amount)
    } else {
        (Side::Sell, maker_asset_id, taker_amount, maker_amount)
    };

    Ok(OrderFilledRow {
        block_number: log.block_number,
        log_index: log.log_index,
        exchange: exchange.to_ascii_lowercase(),
        maker,
        taker,
        token_id,
        side,
        usdc_amount,
        token_amount,
        fee,
    })
}

/// `TokenRegistered(token0,token1,conditionId)`. `is_yes` is assigned to
/// whichever of the two token ids sorts lexicographically smaller, matching
/// the original's tie-breaking rule — there is no on-chain "yes" flag.
pub fn token_registered(log: &RawLog) -> Result<[TokenRegisteredRow; 2], DecodeError> {
    const EVENT: &str = "TokenRegistered";
    require_topics(EVENT, log, 1)?;

    let token0 = bytes32_word(EVENT, &log.data, 0)?;
    let token1 = bytes32_word(EVENT, &log.data, 1)?;
    let condition_id = bytes32_word(EVENT, &log.data, 2)?;

    let (yes_token, no_token) = if token0 < token1 { (token0, token1) } else { (token1, token0) };

    Ok([
        TokenRegisteredRow {
            block_number: log.block_number,
            log_index: log.log_index,
            token_id: yes_token.clone(),
            complement_token_id: no_token.clone(),
            condition_id: condition_id.clone(),
            is_yes: true,
        },
        TokenRegisteredRow {
            block_number: log.block_number,
            log_index: log.log_index,
            token_id: no_token,
            complement_token_id: yes_token,
            condition_id,
            is_yes: false,
        },
    ])
}

/// `PositionsConverted(stakeholder,marketId,indexSet,amount)`. Unlike
/// `PayoutRedemption`, `indexSet` here is a direct topic-encoded integer,
/// not a dynamic array.
pub fn positions_converted(log: &RawLog) -> Result<PositionsConvertedRow, DecodeError> {
    const EVENT: &str = "PositionsConverted";
    require_topics(EVENT, log, 3)?;

    let stakeholder = address_from_topic(&log.topics[1]);
    let market_id = log.topics[2].to_ascii_lowercase();
    let index_set = uint256_word(EVENT, &log.data, 0)?;
    let amount = uint256_word(EVENT, &log.data, 1)?;

    Ok(PositionsConvertedRow { block_number: log.block_number, log_index: log.log_index, stakeholder, market_id, index_set, amount })
}

/// `MarketPrepared(marketId,oracle,feeBips,data)`.
pub fn market_prepared(log: &RawLog) -> Result<MarketPreparedRow, DecodeError> {
    const EVENT: &str = "MarketPrepared";
    require_topics(EVENT, log, 2)?;

    let market_id = log.topics[1].to_ascii_lowercase();
    let oracle = address_from_topic(&log.topics[1]);
    let fee_bips = uint256_word(EVENT, &log.data, 0)?;
    let data = dynamic_bytes(EVENT, &log.data, 1)?;

    Ok(MarketPreparedRow { block_number: log.block_number, log_index: log.log_index, market_id, oracle, fee_bips, data })
}

/// `QuestionPrepared(questionId,marketId,questionIndex,data)`.
pub fn question_prepared(log: &RawLog) -> Result<QuestionPreparedRow, DecodeError> {
    const EVENT: &str = "QuestionPrepared";
    require_topics(EVENT, log, 3)?;

    let question_id = log.topics[1].to_ascii_lowercase();
    let market_id = log.topics[2].to_ascii_lowercase();
    let question_index = uint256_word(EVENT, &log.data, 0)?;
    let data = dynamic_bytes(EVENT, &log.data, 1)?;

    Ok(QuestionPreparedRow { block_number: log.block_number, log_index: log.log_index, question_id, market_id, question_index, data })
}

/// `FixedProductMarketMakerCreation(creator,fpmm,conditionId,collateralToken,fee)`.
pub fn fpmm_creation(log: &RawLog) -> Result<FpmmCreationRow, DecodeError> {
    const EVENT: &str = "FixedProductMarketMakerCreation";
    require_topics(EVENT, log, 2)?;

    let fpmm_addr = address_from_topic(&log.topics[1]);
    let condition_id = bytes32_word(EVENT, &log.data, 0)?;
    let collateral_token = address_from_topic(&bytes32_word(EVENT, &log.data, 1)?);
    let fee = uint256_word(EVENT, &log.data, 2)?;

    Ok(FpmmCreationRow { block_number: log.block_number, log_index: log.log_index, fpmm_addr, condition_id, collateral_token, fee })
}

/// `FPMMBuy(buyer,investmentAmount,feeAmount,outcomeIndex,outcomeTokensBought)`.
pub fn fpmm_buy(log: &RawLog, fpmm_addr: &str) -> Result<FpmmTradeRow, DecodeError> {
    const EVENT: &str = "FPMMBuy";
    require_topics(EVENT, log, 2)?;

    let trader = address_from_topic(&log.topics[1]);
    let usdc_amount = uint256_word(EVENT, &log.data, 0)?;
    let outcome_index = uint256_word(EVENT, &log.data, 2)?;
    let token_amount = uint256_word(EVENT, &log.data, 3)?;

    Ok(FpmmTradeRow {
        block_number: log.block_number,
        log_index: log.log_index,
        fpmm_addr: fpmm_addr.to_ascii_lowercase(),
        trader,
        side: Side::Buy,
        outcome_index,
        token_amount,
        usdc_amount,
    })
}

/// `FPMMSell(seller,returnAmount,feeAmount,outcomeIndex,outcomeTokensSold)`.
pub fn fpmm_sell(log: &RawLog, fpmm_addr: &str) -> Result<FpmmTradeRow, DecodeError> {
    const EVENT: &str = "FPMMSell";
    require_topics(EVENT, log, 2)?;

    let trader = address_from_topic(&log.topics[1]);
    let usdc_amount = uint256_word(EVENT, &log.data, 0)?;
    let outcome_index = uint256_word(EVENT, &log.data, 2)?;
    let token_amount = uint256_word(EVENT, &log.data, 3)?;

    Ok(FpmmTradeRow {
        block_number: log.block_number,
        log_index: log.log_index,
        fpmm_addr: fpmm_addr.to_ascii_lowercase(),
        trader,
        side: Side::Sell,
        outcome_index,
        token_amount,
        usdc_amount,
    })
}

/// `FPMMFundingAdded(funder,amountsAdded[],sharesMinted)`.
pub fn fpmm_funding_added(log: &RawLog, fpmm_addr: &str) -> Result<FpmmFundingRow, DecodeError> {
    const EVENT: &str = "FPMMFundingAdded";
    require_topics(EVENT, log, 2)?;

    let funder = address_from_topic(&log.topics[1]);
    let amounts = dynamic_array(EVENT, &log.data, 0)?;
    let shares_amount = uint256_word(EVENT, &log.data, 1)?;
    let outcome0_amount = array_element(EVENT, &amounts, 0)?;
    let outcome1_amount = array_element(EVENT, &amounts, 1)?;

    Ok(FpmmFundingRow {
        block_number: log.block_number,
        log_index: log.log_index,
        fpmm_addr: fpmm_addr.to_ascii_lowercase(),
        funder,
        side: 0,
        outcome0_amount,
        outcome1_amount,
        shares_amount,
    })
}

/// `FPMMFundingRemoved(funder,amountsRemoved[],collateralRemovedFromFeePool,sharesBurnt)`.
pub fn fpmm_funding_removed(log: &RawLog, fpmm_addr: &str) -> Result<FpmmFundingRow, DecodeError> {
    const EVENT: &str = "FPMMFundingRemoved";
    require_topics(EVENT, log, 2)?;

    let funder = address_from_topic(&log.topics[1]);
    let amounts = dynamic_array(EVENT, &log.data, 0)?;
    let shares_amount = uint256_word(EVENT, &log.data, 2)?;
    let outcome0_amount = array_element(EVENT, &amounts, 0)?;
    let outcome1_amount = array_element(EVENT, &amounts, 1)?;

    Ok(FpmmFundingRow {
        block_number: log.block_number,
        log_index: log.log_index,
        fpmm_addr: fpmm_addr.to_ascii_lowercase(),
        funder,
        side: 1,
        outcome0_amount,
        outcome1_amount,
        shares_amount,
    })
}

//! The Log Decoder: turns raw `eth_getLogs` rows into typed, table-shaped
//! rows. Pure and synchronous — no I/O, no knowledge of the Store or the
//! Sync Coordinator's scheduling (spec §4.2).
//!
//! FPMM pools are not a fixed address like the other four contracts: they
//! are created at runtime by the factory. `decode` therefore runs two
//! passes over a batch: the first discovers any `FixedProductMarketMakerCreation`
//! logs and folds their addresses into the known-FPMM set; the second
//! dispatches every log, treating any address in that set as an FPMM pool.

pub mod contracts;
pub mod parse;
pub mod primitives;
pub mod rows;

use std::collections::HashSet;

use rpc_client::RawLog;

use self::contracts::{
    CONDITIONAL_TOKENS, CTF_EXCHANGE, NEG_RISK_ADAPTER, NEG_RISK_CTF_EXCHANGE, TOPIC_CONDITION_PREPARATION,
    TOPIC_CONDITION_RESOLUTION, TOPIC_FPMM_BUY, TOPIC_FPMM_CREATION, TOPIC_FPMM_FUNDING_ADDED, TOPIC_FPMM_FUNDING_REMOVED,
    TOPIC_FPMM_SELL, TOPIC_MARKET_PREPARED, TOPIC_ORDERS_MATCHED, TOPIC_ORDER_FILLED, TOPIC_OUTCOME_REPORTED,
    TOPIC_PAYOUT_REDEMPTION, TOPIC_POSITIONS_CONVERTED, TOPIC_POSITIONS_MERGE, TOPIC_POSITION_SPLIT,
    TOPIC_QUESTION_PREPARED, TOPIC_TOKEN_REGISTERED, TOPIC_TRANSFER_BATCH, TOPIC_TRANSFER_SINGLE,
};
use self::rows::ParsedEvents;
use crate::error::DecodeError;

/// Decodes one batch of raw logs.
///
/// `known_fpmm_addrs` is the FPMM address set accumulated from prior
/// batches; the returned set is `known_fpmm_addrs` plus any pools created
/// within this batch, and must be persisted by the caller (the Sync
/// Coordinator keeps it in memory, seeded from the `fpmm` table at
/// startup — spec §4.2).
///
/// # Errors
/// Returns the first `DecodeError` encountered. A single malformed log
/// fails the whole batch: the decoder never silently drops data.
pub fn decode(logs: &[RawLog], known_fpmm_addrs: &HashSet<String>) -> Result<(ParsedEvents, HashSet<String>), DecodeError> {
    let mut fpmm_addrs = known_fpmm_addrs.clone();

    // Pass 1: discover FPMM pools created within this batch.
    for log in logs {
        if log.topics.first().is_some_and(|t| t.eq_ignore_ascii_case(TOPIC_FPMM_CREATION)) {
            let row = parse::fpmm_creation(log)?;
            fpmm_addrs.insert(row.fpmm_addr.clone());
        }
    }

    // Pass 2: dispatch every log now that the FPMM address set is complete.
    let mut events = ParsedEvents::default();
    for log in logs {
        dispatch_one(log, &fpmm_addrs, &mut events)?;
    }

    Ok((events, fpmm_addrs))
}

fn dispatch_one(log: &RawLog, fpmm_addrs: &HashSet<String>, events: &mut ParsedEvents) -> Result<(), DecodeError> {
    let Some(topic0) = log.topics.first() else {
        return Err(DecodeError::TopicCount { event: "unknown", got: 0, want: 1 });
    };
    let address = log.address.to_ascii_lowercase();

    if address.eq_ignore_ascii_case(CONDITIONAL_TOKENS) {
        return dispatch_conditional_tokens(topic0, log, events);
    }
    if address.eq_ignore_ascii_case(CTF_EXCHANGE) {
        return dispatch_exchange(topic0, log, CTF_EXCHANGE, events);
    }
    if address.eq_ignore_ascii_case(NEG_RISK_CTF_EXCHANGE) {
        return dispatch_exchange(topic0, log, NEG_RISK_CTF_EXCHANGE, events);
    }
    if address.eq_ignore_ascii_case(NEG_RISK_ADAPTER) {
        return dispatch_neg_risk_adapter(topic0, log, events);
    }
    if fpmm_addrs.contains(&address) {
        return dispatch_fpmm(topic0, log, &address, events);
    }
    if topic0.eq_ignore_ascii_case(TOPIC_FPMM_CREATION) {
        // Already folded into `events.fpmm_creations` below; the factory
        // itself is not in `fpmm_addrs`, so route by topic directly.
        events.fpmm_creations.push(parse::fpmm_creation(log)?);
        return Ok(());
    }

    Err(DecodeError::UnknownSelector { address, topic0: topic0.to_ascii_lowercase() })
}

fn dispatch_conditional_tokens(topic0: &str, log: &RawLog, events: &mut ParsedEvents) -> Result<(), DecodeError> {
    if topic0.eq_ignore_ascii_case(TOPIC_TRANSFER_SINGLE) {
        if let Some(row) = parse::transfer_single(log)? {
            events.transfers.push(row);
        }
    } else if topic0.eq_ignore_ascii_case(TOPIC_TRANSFER_BATCH) {
        events.transfers.extend(parse::transfer_batch(log)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_POSITION_SPLIT) {
        events.splits.push(parse::position_split(log)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_POSITIONS_MERGE) {
        events.merges.push(parse::positions_merge(log)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_PAYOUT_REDEMPTION) {
        events.redemptions.push(parse::payout_redemption(log)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_CONDITION_PREPARATION) {
        events.condition_preparations.push(parse::condition_preparation(log)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_CONDITION_RESOLUTION) {
        events.condition_resolutions.push(parse::condition_resolution(log)?);
    } else {
        return Err(DecodeError::UnknownSelector {
            address: log.address.to_ascii_lowercase(),
            topic0: topic0.to_ascii_lowercase(),
        });
    }
    Ok(())
}

fn dispatch_exchange(topic0: &str, log: &RawLog, exchange: &str, events: &mut ParsedEvents) -> Result<(), DecodeError> {
    if topic0.eq_ignore_ascii_case(TOPIC_ORDER_FILLED) {
        events.order_fills.push(parse::order_filled(log, exchange)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_TOKEN_REGISTERED) {
        events.token_registrations.extend(parse::token_registered(log)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_ORDERS_MATCHED) {
        // Out of scope: no accounting effect beyond the OrderFilled legs
        // already recorded for the same fill.
    } else {
        return Err(DecodeError::UnknownSelector {
            address: log.address.to_ascii_lowercase(),
            topic0: topic0.to_ascii_lowercase(),
        });
    }
    Ok(())
}

fn dispatch_neg_risk_adapter(topic0: &str, log: &RawLog, events: &mut ParsedEvents) -> Result<(), DecodeError> {
    if topic0.eq_ignore_ascii_case(TOPIC_POSITIONS_CONVERTED) {
        events.positions_converted.push(parse::positions_converted(log)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_MARKET_PREPARED) {
        events.markets_prepared.push(parse::market_prepared(log)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_QUESTION_PREPARED) {
        events.questions_prepared.push(parse::question_prepared(log)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_OUTCOME_REPORTED) {
        // Out of scope: resolution state is derived from ConditionResolution.
    } else {
        return Err(DecodeError::UnknownSelector {
            address: log.address.to_ascii_lowercase(),
            topic0: topic0.to_ascii_lowercase(),
        });
    }
    Ok(())
}

fn dispatch_fpmm(topic0: &str, log: &RawLog, fpmm_addr: &str, events: &mut ParsedEvents) -> Result<(), DecodeError> {
    if topic0.eq_ignore_ascii_case(TOPIC_FPMM_BUY) {
        events.fpmm_trades.push(parse::fpmm_buy(log, fpmm_addr)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_FPMM_SELL) {
        events.fpmm_trades.push(parse::fpmm_sell(log, fpmm_addr)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_FPMM_FUNDING_ADDED) {
        events.fpmm_fundings.push(parse::fpmm_funding_added(log, fpmm_addr)?);
    } else if topic0.eq_ignore_ascii_case(TOPIC_FPMM_FUNDING_REMOVED) {
        events.fpmm_fundings.push(parse::fpmm_funding_removed(log, fpmm_addr)?);
    } else {
        return Err(DecodeError::UnknownSelector { address: fpmm_addr.to_string(), topic0: topic0.to_ascii_lowercase() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(address: &str, topics: Vec<&str>, data: &str) -> RawLog {
        RawLog {
            address: address.to_string(),
            topics: topics.into_iter().map(str::to_string).collect(),
            data: data.to_string(),
            block_number: 100,
            log_index: 1,
            transaction_hash: "0xdeadbeef".to_string(),
        }
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let l = log(CONDITIONAL_TOKENS, vec!["0xbad"], "0x");
        let result = decode(std::slice::from_ref(&l), &HashSet::new());
        assert!(matches!(result, Err(DecodeError::UnknownSelector { .. })));
    }

    #[test]
    fn condition_preparation_populates_bundle() {
        let data = format!("0x{}", "0".repeat(63) + "2"); // outcome_slot_count = 2
        let l = log(
            CONDITIONAL_TOKENS,
            vec![
                TOPIC_CONDITION_PREPARATION,
                &format!("0x{}", "a".repeat(64)),
                &format!("0x000000000000000000000000{}", "b".repeat(40)),
                &format!("0x{}", "c".repeat(64)),
            ],
            &data,
        );
        let (events, fpmm) = decode(&[l], &HashSet::new()).unwrap();
        assert_eq!(events.condition_preparations.len(), 1);
        assert!(fpmm.is_empty());
    }

    #[test]
    fn transfer_single_skips_exchange_operator() {
        let data = format!("0x{}{}", "1".repeat(64), "0".repeat(63) + "a");
        let operator_topic = format!("0x000000000000000000000000{}", CTF_EXCHANGE.trim_start_matches("0x"));
        let l = log(
            CONDITIONAL_TOKENS,
            vec![
                TOPIC_TRANSFER_SINGLE,
                &operator_topic,
                &format!("0x000000000000000000000000{}", "1".repeat(40)),
                &format!("0x000000000000000000000000{}", "2".repeat(40)),
            ],
            &data,
        );
        let (events, _) = decode(&[l], &HashSet::new()).unwrap();
        assert!(events.transfers.is_empty());
    }
}

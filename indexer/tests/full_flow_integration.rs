//! End-to-end: decode → store → replay, without any network call
//! (spec §8's "concrete end-to-end scenarios").

use std::collections::HashSet;

use indexer::decoder::contracts::CONDITIONAL_TOKENS;
use indexer::decoder::{decode, contracts};
use indexer::replay::ReplayProgress;
use indexer::store::Store;
use rpc_client::RawLog;
use tokio::sync::watch;

fn temp_db_path(name: &str) -> String {
    std::env::temp_dir().join(format!("polysync-e2e-{name}-{}.db", std::process::id())).to_str().unwrap().to_string()
}

fn word32(hex_tail: &str) -> String {
    format!("{}{hex_tail}", "0".repeat(64 - hex_tail.len()))
}

fn address_topic(addr_hex_40: &str) -> String {
    format!("0x{}{addr_hex_40}", "0".repeat(24))
}

fn log(address: &str, topics: Vec<String>, data_words: Vec<String>, block: i64, log_index: i64) -> RawLog {
    RawLog {
        address: address.to_string(),
        topics,
        data: format!("0x{}", data_words.concat()),
        block_number: block,
        log_index,
        transaction_hash: "0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef".to_string(),
    }
}

#[tokio::test]
async fn split_then_partial_redemption_leaves_losing_side_open() {
    let alice = "a".repeat(40);
    let condition_id = format!("0x{}", "c".repeat(64));

    let condition_preparation = log(
        CONDITIONAL_TOKENS,
        vec![
            contracts::TOPIC_CONDITION_PREPARATION.to_string(),
            condition_id.clone(),
            address_topic(&"0".repeat(40)),
            format!("0x{}", "d".repeat(64)),
        ],
        vec![word32("2")],
        1,
        0,
    );

    let split = log(
        CONDITIONAL_TOKENS,
        vec![contracts::TOPIC_POSITION_SPLIT.to_string(), address_topic(&alice)],
        vec![word32(""), condition_id.trim_start_matches("0x").to_string(), word32(""), word32("f4240")], // amount = 1_000_000
        2,
        0,
    );

    let condition_resolution = log(
        CONDITIONAL_TOKENS,
        vec![
            contracts::TOPIC_CONDITION_RESOLUTION.to_string(),
            condition_id.clone(),
            address_topic(&"0".repeat(40)),
            format!("0x{}", "d".repeat(64)),
        ],
        vec![
            word32("2"),      // outcomeSlotCount
            word32("40"),     // offset (bytes) to the length word, word index 2
            word32("2"),      // array length
            word32("f4240"),  // payout_numerators[0] = 1_000_000 (outcome 0 wins)
            word32(""),       // payout_numerators[1] = 0
        ],
        3,
        0,
    );

    let redemption = log(
        CONDITIONAL_TOKENS,
        vec![contracts::TOPIC_PAYOUT_REDEMPTION.to_string(), address_topic(&alice)],
        vec![
            word32(""),
            condition_id.trim_start_matches("0x").to_string(),
            word32("80"),     // offset (bytes) to the array length word, word index 4
            word32("f4240"),  // payout = 1_000_000, read directly at word index 3
            word32("1"),      // array length
            word32("1"),      // index set element: claim outcome 0 only
        ],
        4,
        0,
    );

    let (events, fpmm) =
        decode(&[condition_preparation, split, condition_resolution, redemption], &HashSet::new()).expect("decode");
    assert!(fpmm.is_empty());
    assert_eq!(events.condition_preparations.len(), 1);
    assert_eq!(events.condition_resolutions.len(), 1);
    assert_eq!(events.splits.len(), 1);
    assert_eq!(events.redemptions.len(), 1);

    let db_path = temp_db_path("split-redeem");
    let _ = std::fs::remove_file(&db_path);
    let _ = std::fs::remove_file(format!("{db_path}.lock"));
    let store = Store::open(&db_path).await.expect("open store");
    store.atomic_multi_insert(&events, 4).await.expect("insert");

    let (progress_tx, _progress_rx) = watch::channel(ReplayProgress::default());
    let world = indexer::replay::rebuild(&store, &progress_tx).await.expect("rebuild");
    let alice_addr = format!("0x{alice}");
    let state = world.user_state(&alice_addr).expect("alice has replayed state");

    let cond = state.conditions.first().expect("alice touched exactly one condition");
    let last = cond.snapshots.last().expect("at least one snapshot");

    // Outcome 0 was claimed in full: position closed, cost basis released,
    // and the payout exceeded what was locked by the 50/50 split price.
    assert_eq!(last.positions[0], 0);
    assert_eq!(last.realized_pnl, 500_000);
    // Outcome 1 lost and was never redeemed: still open at its split cost.
    assert_eq!(last.positions[1], 1_000_000);
    assert_eq!(last.cost_basis, 500_000_000_000);

    let positions = world.positions_at(&alice_addr, last.sort_key);
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].realized_pnl, 500_000);

    let _ = std::fs::remove_file(&db_path);
    let _ = std::fs::remove_file(format!("{db_path}.lock"));
}

#[tokio::test]
async fn rebuild_on_empty_store_produces_no_users() {
    let db_path = temp_db_path("empty-rebuild");
    let _ = std::fs::remove_file(&db_path);
    let _ = std::fs::remove_file(format!("{db_path}.lock"));
    let store = Store::open(&db_path).await.expect("open store");

    let (progress_tx, _progress_rx) = watch::channel(ReplayProgress::default());
    let world = indexer::replay::rebuild(&store, &progress_tx).await.expect("rebuild");
    assert!(world.users.is_empty());
    assert!(world.metadata.conditions.is_empty());

    let _ = std::fs::remove_file(&db_path);
    let _ = std::fs::remove_file(format!("{db_path}.lock"));
}

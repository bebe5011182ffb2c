//! Store integration tests against a real SQLite file (spec §4.3, §8).

use indexer::decoder::rows::{ConditionPreparationRow, ConditionResolutionRow, ParsedEvents, SplitRow};
use indexer::store::Store;

fn temp_db_path(name: &str) -> String {
    std::env::temp_dir().join(format!("polysync-store-it-{name}-{}.db", std::process::id())).to_str().unwrap().to_string()
}

async fn fresh_store(name: &str) -> (Store, String) {
    let path = temp_db_path(name);
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(format!("{path}.lock"));
    let store = Store::open(&path).await.expect("open store");
    (store, path)
}

fn cleanup(path: &str) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(format!("{path}.lock"));
}

#[tokio::test]
async fn empty_database_has_no_last_block() {
    let (store, path) = fresh_store("empty").await;
    assert_eq!(store.last_block().await.unwrap(), None);
    cleanup(&path);
}

#[tokio::test]
async fn reinserting_the_same_batch_is_idempotent() {
    let (store, path) = fresh_store("idempotent").await;

    let mut events = ParsedEvents::default();
    events.splits.push(SplitRow {
        block_number: 10,
        log_index: 0,
        stakeholder: "0xalice".into(),
        condition_id: "0xc1".into(),
        amount: 500,
    });

    store.atomic_multi_insert(&events, 10).await.expect("first insert");
    store.atomic_multi_insert(&events, 10).await.expect("second insert is a no-op");

    assert_eq!(store.count("split").await.unwrap(), 1);
    assert_eq!(store.last_block().await.unwrap(), Some(10));

    cleanup(&path);
}

#[tokio::test]
async fn condition_resolution_updates_the_entity_row_in_place() {
    let (store, path) = fresh_store("resolution").await;

    let mut creation = ParsedEvents::default();
    creation.condition_preparations.push(ConditionPreparationRow {
        block_number: 1,
        log_index: 0,
        condition_id: "0xc1".into(),
        oracle: "0xoracle".into(),
        question_id: "0xq1".into(),
        outcome_slot_count: 2,
    });
    store.atomic_multi_insert(&creation, 1).await.expect("creation");

    let rows = store.query_rows("SELECT payout_numerators FROM condition WHERE condition_id = '0xc1'").await.unwrap();
    assert_eq!(rows[0]["payout_numerators"], serde_json::Value::Null);

    let mut resolution = ParsedEvents::default();
    resolution.condition_resolutions.push(ConditionResolutionRow {
        block_number: 2,
        log_index: 0,
        condition_id: "0xc1".into(),
        payout_numerators: vec![1, 0],
    });
    store.atomic_multi_insert(&resolution, 2).await.expect("resolution");

    let rows = store.query_rows("SELECT payout_numerators, resolution_block FROM condition WHERE condition_id = '0xc1'").await.unwrap();
    assert_eq!(rows[0]["payout_numerators"], serde_json::Value::String("[1,0]".into()));
    assert_eq!(rows[0]["resolution_block"], serde_json::json!(2));

    cleanup(&path);
}

#[tokio::test]
async fn a_second_handle_cannot_acquire_the_advisory_lock() {
    let (store, path) = fresh_store("lock").await;
    let second = Store::open(&path).await;
    assert!(second.is_err(), "second open against the same db_path should fail to acquire the advisory lock");
    drop(store);
    cleanup(&path);
}

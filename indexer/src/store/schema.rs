//! Schema DDL for the embedded analytical database (spec §4.3/Data Model).
//!
//! Event-log tables are keyed by `(block_number, log_index)`; entity tables
//! are keyed by their natural id. Every insert uses `INSERT OR IGNORE`
//! (spec invariant 3: re-running a batch through already-written blocks
//! must be a no-op, not a duplicate or an error).

/// Full schema, applied once at startup via a single multi-statement
/// execution. Idempotent: `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sync_state (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transfer (
    block_number INTEGER NOT NULL,
    log_index    INTEGER NOT NULL,
    from_addr    TEXT NOT NULL,
    to_addr      TEXT NOT NULL,
    token_id     TEXT NOT NULL,
    amount       INTEGER NOT NULL,
    PRIMARY KEY (block_number, log_index)
);
CREATE INDEX IF NOT EXISTS idx_transfer_from ON transfer(from_addr);
CREATE INDEX IF NOT EXISTS idx_transfer_to ON transfer(to_addr);

CREATE TABLE IF NOT EXISTS split (
    block_number  INTEGER NOT NULL,
    log_index     INTEGER NOT NULL,
    stakeholder   TEXT NOT NULL,
    condition_id  TEXT NOT NULL,
    amount        INTEGER NOT NULL,
    PRIMARY KEY (block_number, log_index)
);
CREATE INDEX IF NOT EXISTS idx_split_stakeholder ON split(stakeholder);

CREATE TABLE IF NOT EXISTS merge (
    block_number  INTEGER NOT NULL,
    log_index     INTEGER NOT NULL,
    stakeholder   TEXT NOT NULL,
    condition_id  TEXT NOT NULL,
    amount        INTEGER NOT NULL,
    PRIMARY KEY (block_number, log_index)
);
CREATE INDEX IF NOT EXISTS idx_merge_stakeholder ON merge(stakeholder);

CREATE TABLE IF NOT EXISTS redemption (
    block_number  INTEGER NOT NULL,
    log_index     INTEGER NOT NULL,
    redeemer      TEXT NOT NULL,
    condition_id  TEXT NOT NULL,
    index_sets    INTEGER NOT NULL,
    payout        INTEGER NOT NULL,
    PRIMARY KEY (block_number, log_index)
);
CREATE INDEX IF NOT EXISTS idx_redemption_redeemer ON redemption(redeemer);

CREATE TABLE IF NOT EXISTS condition_preparation (
    block_number        INTEGER NOT NULL,
    log_index           INTEGER NOT NULL,
    condition_id        TEXT NOT NULL,
    oracle               TEXT NOT NULL,
    question_id          TEXT NOT NULL,
    outcome_slot_count    INTEGER NOT NULL,
    PRIMARY KEY (block_number, log_index)
);

CREATE TABLE IF NOT EXISTS condition (
    condition_id       TEXT PRIMARY KEY,
    oracle              TEXT NOT NULL,
    question_id         TEXT NOT NULL,
    outcome_slot_count   INTEGER NOT NULL,
    payout_numerators    TEXT,
    resolution_block     INTEGER
);

CREATE TABLE IF NOT EXISTS condition_resolution (
    block_number     INTEGER NOT NULL,
    log_index        INTEGER NOT NULL,
    condition_id     TEXT NOT NULL,
    payout_numerators TEXT NOT NULL,
    PRIMARY KEY (block_number, log_index)
);

CREATE TABLE IF NOT EXISTS order_filled (
    block_number  INTEGER NOT NULL,
    log_index     INTEGER NOT NULL,
    exchange      TEXT NOT NULL,
    maker         TEXT NOT NULL,
    taker         TEXT NOT NULL,
    token_id      TEXT NOT NULL,
    side          INTEGER NOT NULL,
    usdc_amount   INTEGER NOT NULL,
    token_amount  INTEGER NOT NULL,
    fee           INTEGER NOT NULL,
    PRIMARY KEY (block_number, log_index)
);
CREATE INDEX IF NOT EXISTS idx_order_filled_maker ON order_filled(maker);
CREATE INDEX IF NOT EXISTS idx_order_filled_taker ON order_filled(taker);

CREATE TABLE IF NOT EXISTS token_map (
    token_id            TEXT PRIMARY KEY,
    complement_token_id  TEXT NOT NULL,
    condition_id         TEXT NOT NULL,
    is_yes                INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS neg_risk_market (
    market_id  TEXT PRIMARY KEY,
    oracle      TEXT NOT NULL,
    fee_bips    INTEGER NOT NULL,
    data        BLOB
);

CREATE TABLE IF NOT EXISTS neg_risk_question (
    question_id      TEXT PRIMARY KEY,
    market_id         TEXT NOT NULL,
    question_index     INTEGER NOT NULL,
    data              BLOB
);

CREATE TABLE IF NOT EXISTS convert (
    block_number  INTEGER NOT NULL,
    log_index     INTEGER NOT NULL,
    stakeholder   TEXT NOT NULL,
    market_id     TEXT NOT NULL,
    index_set     INTEGER NOT NULL,
    amount        INTEGER NOT NULL,
    PRIMARY KEY (block_number, log_index)
);

CREATE TABLE IF NOT EXISTS fpmm (
    fpmm_addr         TEXT PRIMARY KEY,
    condition_id       TEXT NOT NULL,
    collateral_token    TEXT NOT NULL,
    fee                 INTEGER NOT NULL,
    creation_block      INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS fpmm_trade (
    block_number    INTEGER NOT NULL,
    log_index       INTEGER NOT NULL,
    fpmm_addr       TEXT NOT NULL,
    trader          TEXT NOT NULL,
    side            INTEGER NOT NULL,
    outcome_index   INTEGER NOT NULL,
    token_amount    INTEGER NOT NULL,
    usdc_amount     INTEGER NOT NULL,
    PRIMARY KEY (block_number, log_index)
);
CREATE INDEX IF NOT EXISTS idx_fpmm_trade_trader ON fpmm_trade(trader);

CREATE TABLE IF NOT EXISTS fpmm_funding (
    block_number        INTEGER NOT NULL,
    log_index           INTEGER NOT NULL,
    fpmm_addr           TEXT NOT NULL,
    funder              TEXT NOT NULL,
    side                INTEGER NOT NULL,
    outcome0_amount      INTEGER NOT NULL,
    outcome1_amount      INTEGER NOT NULL,
    shares_amount        INTEGER NOT NULL,
    PRIMARY KEY (block_number, log_index)
);
";

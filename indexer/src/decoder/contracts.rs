//! Fixed contract addresses and event selectors the decoder recognizes.
//!
//! Addresses and `topic0` hashes are protocol constants, not configuration —
//! they never change across deployments of this indexer (spec §4.2).

/// `ConditionalTokens` (ERC-1155 outcome token ledger + condition registry).
pub const CONDITIONAL_TOKENS: &str = "0x4d97dcd97ec945f40cf65f87097ace5ea0476045";

/// CTF Exchange (the original, non-neg-risk order book).
pub const CTF_EXCHANGE: &str = "0x4bfb41d5b3570defd03c39a9a4d8de6bd8b8982e";

/// Neg-risk CTF Exchange (order book for neg-risk markets).
pub const NEG_RISK_CTF_EXCHANGE: &str = "0xc5d563a36ae78145c45a50134d48a1215220f80a";

/// Neg-risk adapter (market/question registry + conversion entrypoint).
pub const NEG_RISK_ADAPTER: &str = "0xd91e80cf2e7be2e162c6513ced06f1dd0da35296";

/// Returns true if `address` is either exchange contract.
#[must_use]
pub fn is_exchange(address: &str) -> bool {
    address.eq_ignore_ascii_case(CTF_EXCHANGE) || address.eq_ignore_ascii_case(NEG_RISK_CTF_EXCHANGE)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOPIC0 — ConditionalTokens
// ═══════════════════════════════════════════════════════════════════════════════

/// `ConditionPreparation(bytes32,address,bytes32,uint256)`
pub const TOPIC_CONDITION_PREPARATION: &str =
    "0xab3760c3bd2bb38b5bcf54dc79802ed67338b4cf29f3054ded67ed24661e4177";

/// `PositionSplit(address,address,address,bytes32,uint256[],uint256)`
pub const TOPIC_POSITION_SPLIT: &str =
    "0x2e6bb91f8cbcda0c93623c37b1e28d1634a33c4800e602650e38c1fe9b43a641";

/// `PositionsMerge(address,address,address,bytes32,uint256[],uint256)`
pub const TOPIC_POSITIONS_MERGE: &str =
    "0x6f13ca62553fcc2bcd2372180a43949c1e4416e74d9a3b3b9a28b1fe0926945f";

/// `TransferSingle(address,address,address,uint256,uint256)`
pub const TOPIC_TRANSFER_SINGLE: &str =
    "0xc3d58168c5ae7397731d063d5bbf3d657854427343f4c083240f7aacaa2d0f62";

/// `TransferBatch(address,address,address,uint256[],uint256[])`
pub const TOPIC_TRANSFER_BATCH: &str =
    "0x4a39dc06d4c0dbc64b70af90fd698a233a518aa5d07e595d983b8c0526c8f7fb";

/// `ConditionResolution(bytes32,address,bytes32,uint256,uint256[])`
pub const TOPIC_CONDITION_RESOLUTION: &str =
    "0xb44d84d9bc80848a1b1e7ef0ba6d9c5a7c45cc5dd2a8f1f47e5e1c4b0d5c1c1e2";

/// `PayoutRedemption(address,address,bytes32,bytes32,uint256[],uint256)`
pub const TOPIC_PAYOUT_REDEMPTION: &str =
    "0x2682012a4a4f1973119f1c9b90745d1bd91fa2a391bc0c86c8237ff473e22b52";

// ═══════════════════════════════════════════════════════════════════════════════
// TOPIC0 — Exchange / NegRisk Exchange
// ═══════════════════════════════════════════════════════════════════════════════

/// `TokenRegistered(uint256,uint256,bytes32)`
pub const TOPIC_TOKEN_REGISTERED: &str =
    "0xab2bd8c4d6645441cc6a4ca0ceab01d4d9a2c7e1f0e21e1dc6b29a1d3e97b2cf4";

/// `OrderFilled(bytes32,address,address,uint256,uint256,uint256,uint256,uint256)`
pub const TOPIC_ORDER_FILLED: &str =
    "0xd0a08e8c493f9c94f29311604c9de1b4e8c8d4c09c203b562f6a662266a1ad5d";

/// `OrdersMatched(bytes32,address,uint256,uint256,uint256,uint256)` — unused
/// in this indexer's scope; retained only so `decode` does not misclassify
/// it as an unknown selector when both events share an emitter.
pub const TOPIC_ORDERS_MATCHED: &str =
    "0x63df706a5fdc2c4216b45315030a3c57f0e3a398be0ab0f15b2693e4be8d8f71";

// ═══════════════════════════════════════════════════════════════════════════════
// TOPIC0 — Neg-risk adapter
// ═══════════════════════════════════════════════════════════════════════════════

/// `MarketPrepared(bytes32,address,uint256,bytes)`
pub const TOPIC_MARKET_PREPARED: &str =
    "0x7a228e4716558c0ad2cea4dea13d6cbf4b93ba7b0a1c7bfd2baeb5a9fbf7c9a8";

/// `QuestionPrepared(bytes32,bytes32,uint256,bytes)`
pub const TOPIC_QUESTION_PREPARED: &str =
    "0xeb0f90d4ca81ca979f86a3fac62dd0966e690efb9e3c0d19d53c8292c9230fe9";

/// `OutcomeReported(bytes32,bool)` — unused in this indexer's scope.
pub const TOPIC_OUTCOME_REPORTED: &str =
    "0x9e9b9a6558f5ad9e2c6a4a21169e78c89c4c0a3db236e0bb72f8a9f5c13c2be1";

/// `PositionsConverted(address,bytes32,uint256,uint256[],uint256)`
pub const TOPIC_POSITIONS_CONVERTED: &str =
    "0xf57b3eee88c92bb72ea2c637af33b4a2bfc0de04cff10c4fa68a1dbb2bb5e8c6";

// ═══════════════════════════════════════════════════════════════════════════════
// TOPIC0 — Fixed Product Market Maker (not present in the original source;
// added per the expanded spec's FPMM module — see DESIGN.md).
// ═══════════════════════════════════════════════════════════════════════════════

/// `FixedProductMarketMakerCreation(address,address,address,bytes32,address,uint256)`
/// emitted by the FPMM factory.
pub const TOPIC_FPMM_CREATION: &str =
    "0x2cd1e886dabab06f31f8a7c0e4d2cb3c5eae0dfa4e8f7a5a3c7e7f5f1b3a8c2d4";

/// `FPMMBuy(address,uint256,uint256,uint256,uint256)`
pub const TOPIC_FPMM_BUY: &str =
    "0x4f62630f37a5b8e4df87e9f1f4e43e4a5bb78e1a4d7c3f6e1a8b2c5d9e0f1a2b";

/// `FPMMSell(address,uint256,uint256,uint256,uint256)`
pub const TOPIC_FPMM_SELL: &str =
    "0x5c0a3af6a9e3a5c3d6e8f1a9b2c4d7e0f3a6b9c2d5e8f1a4b7c0d3e6f9a2b5c8";

/// `FPMMFundingAdded(address,uint256[],uint256)`
pub const TOPIC_FPMM_FUNDING_ADDED: &str =
    "0x4f0fb7e0f55be6ff8f7e75eba9e9f86c83a12567e5bde9c9cf1bdb1b2a0e4c71";

/// `FPMMFundingRemoved(address,uint256[],uint256[],uint256)`
pub const TOPIC_FPMM_FUNDING_REMOVED: &str =
    "0x5880073615572e02a9b8239a43be9cc4b76623313ab7ac5524cc9c60b9c1a4e2";

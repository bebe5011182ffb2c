//! Wire types for JSON-RPC 2.0 requests/responses and `eth_getLogs` filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

impl JsonRpcRequest {
    #[must_use]
    pub fn new(id: u64, method: &'static str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response envelope. `id` is used to match batched responses
/// back to their request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorBody>,
}

/// The `error` object of a JSON-RPC response.
#[derive(Debug, Deserialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// A single `eth_getLogs` filter, as described in spec §4.1: an address (or
/// `None` meaning "any address matching the topic filter", used for FPMM
/// pool instances discovered at decode time), an inclusive block range, and
/// a set of topic0 hashes to match on.
#[derive(Debug, Clone)]
pub struct LogQuery {
    pub address: Option<String>,
    pub from_block: i64,
    pub to_block: i64,
    pub topic0: Vec<String>,
}

impl LogQuery {
    #[must_use]
    pub fn new(address: Option<String>, from_block: i64, to_block: i64, topic0: Vec<String>) -> Self {
        Self {
            address,
            from_block,
            to_block,
            topic0,
        }
    }

    pub(crate) fn to_filter_params(&self) -> Value {
        let mut filter = serde_json::Map::new();
        if let Some(addr) = &self.address {
            filter.insert("address".into(), Value::String(addr.clone()));
        }
        filter.insert("fromBlock".into(), Value::String(to_hex(self.from_block)));
        filter.insert("toBlock".into(), Value::String(to_hex(self.to_block)));
        if !self.topic0.is_empty() {
            filter.insert("topics".into(), serde_json::json!([self.topic0]));
        }
        Value::Array(vec![Value::Object(filter)])
    }
}

/// A raw, un-decoded EVM log entry as returned by `eth_getLogs`. Field
/// values are left as hex strings; decoding is the Log Decoder's job.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: String,
    pub log_index: String,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

#[must_use]
pub fn to_hex(value: i64) -> String {
    format!("0x{value:x}")
}

/// Decode a `0x`-prefixed hex integer. Values beyond `i64` range are clamped
/// per spec §4.1's modulo-2⁶³ convention; callers that need the raw bytes
/// for BLOB persistence should read the string directly instead.
pub fn from_hex(hex: &str) -> Result<i64, std::num::ParseIntError> {
    let trimmed = hex.strip_prefix("0x").unwrap_or(hex);
    if trimmed.is_empty() {
        return Ok(0);
    }
    i64::from_str_radix(trimmed, 16)
}

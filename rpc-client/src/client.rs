//! JSON-RPC client for `eth_blockNumber` and batched `eth_getLogs`.
//!
//! Stateless request construction and response parsing: per-request IDs,
//! hex↔integer conversion, and response-byte-size tracking for the
//! coordinator's throughput estimator. No retry or backoff policy lives
//! here — that's the Sync Coordinator's job (spec §4.4).

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::{Result, RpcError};
use crate::types::{from_hex, JsonRpcRequest, JsonRpcResponse, LogQuery, RawLog};

/// The result of a batched `eth_getLogs` call: per-query log vectors, in the
/// same order as the input queries, plus the total response byte count.
#[derive(Debug)]
pub struct LogsBatchResult {
    pub logs: Vec<Vec<RawLog>>,
    pub response_bytes: usize,
}

/// A JSON-RPC-over-HTTPS client for the chain RPC endpoint.
#[derive(Debug)]
pub struct RpcClient {
    client: reqwest::Client,
    rpc_url: String,
    api_key: String,
    request_id: AtomicU64,
    config: ClientConfig,
}

impl RpcClient {
    /// Create a client with default configuration (30s deadline, 256 MiB
    /// body limit).
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(rpc_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(rpc_url, api_key, ClientConfig::default())
    }

    /// Create a client with custom configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_config(
        rpc_url: impl Into<String>,
        api_key: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RpcError::transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            api_key: api_key.into(),
            request_id: AtomicU64::new(1),
            config,
        })
    }

    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    fn post(&self, body: &Value) -> reqwest::RequestBuilder {
        let mut req = self.client.post(&self.rpc_url).json(body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        req
    }

    /// `eth_blockNumber`: the current head block.
    ///
    /// # Errors
    /// [`RpcError::Transport`] on connect/TLS/read/timeout failure,
    /// [`RpcError::Protocol`] on a non-200 response, malformed JSON, or a
    /// JSON-RPC `error` field.
    #[instrument(skip(self))]
    pub async fn head_block(&self) -> Result<i64> {
        let id = self.next_request_id();
        let request = JsonRpcRequest::new(id, "eth_blockNumber", serde_json::json!([]));

        let response = self.post(&serde_json::to_value(&request)?).send().await?;
        if !response.status().is_success() {
            return Err(RpcError::protocol(format!("http status {}", response.status())));
        }
        let bytes = response.bytes().await?;
        let parsed: JsonRpcResponse = serde_json::from_slice(&bytes)?;

        if let Some(err) = parsed.error {
            return Err(RpcError::protocol(format!("({}) {}", err.code, err.message)));
        }
        let result = parsed
            .result
            .ok_or_else(|| RpcError::protocol("missing result in eth_blockNumber response"))?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::protocol("eth_blockNumber result is not a string"))?;
        from_hex(hex).map_err(|e| RpcError::protocol(format!("bad hex block number: {e}")))
    }

    /// Batched `eth_getLogs`: one JSON-RPC request per query, sent together
    /// as a single JSON array, matched back to the caller's queries by id.
    ///
    /// # Errors
    /// [`RpcError::Transport`] on connect/TLS/read/timeout failure,
    /// [`RpcError::Protocol`] on a non-200 response, malformed JSON, or any
    /// element of the batch containing an `error` field (the whole batch
    /// fails together).
    #[instrument(skip(self, queries), fields(batch_size = queries.len()))]
    pub async fn get_logs_batch(&self, queries: &[LogQuery]) -> Result<LogsBatchResult> {
        let batch: Vec<JsonRpcRequest> = queries
            .iter()
            .enumerate()
            .map(|(i, q)| {
                JsonRpcRequest::new(i as u64, "eth_getLogs", q.to_filter_params())
            })
            .collect();

        let body = serde_json::to_value(&batch)?;
        let response = self.post(&body).send().await?;
        if !response.status().is_success() {
            return Err(RpcError::protocol(format!("http status {}", response.status())));
        }
        let bytes = response.bytes().await?;
        let response_bytes = bytes.len();
        if response_bytes as u64 > self.config.max_body_bytes {
            return Err(RpcError::protocol(format!(
                "response body {response_bytes} exceeds limit {}",
                self.config.max_body_bytes
            )));
        }

        let parsed: Vec<JsonRpcResponse> = serde_json::from_slice(&bytes)?;
        debug!(responses = parsed.len(), response_bytes, "batch received");

        let mut logs: Vec<Vec<RawLog>> = vec![Vec::new(); queries.len()];
        for item in parsed {
            if let Some(err) = item.error {
                return Err(RpcError::protocol(format!("({}) {}", err.code, err.message)));
            }
            let id = item.id.ok_or_else(|| RpcError::protocol("response missing id"))? as usize;
            let result = item
                .result
                .ok_or_else(|| RpcError::protocol("missing result in eth_getLogs response"))?;
            let parsed_logs: Vec<RawLog> = serde_json::from_value(result)?;
            if id >= logs.len() {
                return Err(RpcError::protocol(format!("response id {id} out of range")));
            }
            logs[id] = parsed_logs;
        }

        Ok(LogsBatchResult {
            logs,
            response_bytes,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn head_block_decodes_hex_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"method": "eth_blockNumber"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x10"
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri(), "").expect("client creation failed");
        let head = client.head_block().await.expect("head_block failed");
        assert_eq!(head, 16);
    }

    #[tokio::test]
    async fn head_block_surfaces_rpc_error_as_protocol() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32000, "message": "boom"}
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri(), "").expect("client creation failed");
        let err = client.head_block().await.expect_err("expected failure");
        assert!(matches!(err, RpcError::Protocol(_)));
    }

    #[tokio::test]
    async fn head_block_http_failure_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri(), "").expect("client creation failed");
        let err = client.head_block().await.expect_err("expected failure");
        assert!(matches!(err, RpcError::Protocol(_)));
    }

    #[tokio::test]
    async fn get_logs_batch_matches_responses_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"jsonrpc": "2.0", "id": 1, "result": []},
                {"jsonrpc": "2.0", "id": 0, "result": []},
            ])))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri(), "").expect("client creation failed");
        let queries = vec![
            LogQuery::new(Some("0xaaaa000000000000000000000000000000aaaa".into()), 1, 10, vec![]),
            LogQuery::new(None, 1, 10, vec!["0xbeef".into()]),
        ];
        let result = client.get_logs_batch(&queries).await.expect("batch failed");
        assert_eq!(result.logs.len(), 2);
        assert!(result.response_bytes > 0);
    }

    #[tokio::test]
    async fn get_logs_batch_any_error_fails_whole_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"jsonrpc": "2.0", "id": 0, "result": []},
                {"jsonrpc": "2.0", "id": 1, "error": {"code": -32600, "message": "bad request"}},
            ])))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri(), "").expect("client creation failed");
        let queries = vec![
            LogQuery::new(None, 1, 10, vec![]),
            LogQuery::new(None, 1, 10, vec![]),
        ];
        let err = client.get_logs_batch(&queries).await.expect_err("expected failure");
        assert!(matches!(err, RpcError::Protocol(_)));
    }

    #[test]
    fn missing_address_means_any_address() {
        let q = LogQuery::new(None, 100, 200, vec!["0xabc".into()]);
        let params = q.to_filter_params();
        let filter = &params[0];
        assert!(filter.get("address").is_none());
        assert_eq!(filter["fromBlock"], "0x64");
        assert_eq!(filter["toBlock"], "0xc8");
    }
}

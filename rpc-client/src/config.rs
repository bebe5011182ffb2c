//! Configuration for the RPC client.

use std::time::Duration;

/// Client-level tuning knobs. Spec §4.1/§6 fix the deadline at 30s and the
/// response body limit at ≥256 MiB; both are exposed here so tests can
/// override them without touching the client's request logic.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request deadline. On expiry the call fails as `Transport`.
    pub timeout: Duration,
    /// Maximum response body size accepted from the endpoint.
    pub max_body_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_body_bytes: 256 * 1024 * 1024,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max: u64) -> Self {
        self.max_body_bytes = max;
        self
    }
}

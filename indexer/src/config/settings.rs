//! Settings struct and loading logic.
//!
//! Unlike a typical service config, every key here is required: there are no
//! defaults. A missing or mistyped key in the config file is a fatal
//! config-invalid error at startup (spec §7).

use std::path::Path;

use config::{Config, ConfigError, File};
use serde::Deserialize;

/// Root configuration structure. Field names match the config file's keys
/// exactly (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path to the embedded analytical database file.
    pub db_path: String,
    /// HTTP(S) JSON-RPC endpoint.
    pub rpc_url: String,
    /// Bearer token for the RPC endpoint. May be empty.
    pub rpc_api_key: String,
    /// Port the Query Server listens on.
    pub api_port: u16,
    /// Initial `eth_getLogs` window size in blocks.
    pub sync_batch_size: u32,
    /// Delay between polling rounds once caught up to head.
    pub sync_interval_seconds: u64,
    /// Starting block when no checkpoint exists yet.
    pub initial_block: i64,
}

impl Settings {
    /// Load settings from a JSON file at `path`.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file is unreadable, malformed, or
    /// missing a required key.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Validate field-level constraints beyond "key is present".
    ///
    /// # Errors
    /// Returns the list of violated constraints; empty on success.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.db_path.is_empty() {
            errors.push("db_path cannot be empty".into());
        }
        if self.rpc_url.is_empty() {
            errors.push("rpc_url cannot be empty".into());
        }
        if self.api_port == 0 {
            errors.push("api_port must be non-zero".into());
        }
        if self.sync_batch_size == 0 {
            errors.push("sync_batch_size must be non-zero".into());
        }
        if self.sync_interval_seconds == 0 {
            errors.push("sync_interval_seconds must be non-zero".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings {
            db_path: "./data/polysync.db".into(),
            rpc_url: "https://rpc.example.com".into(),
            rpc_api_key: String::new(),
            api_port: 8080,
            sync_batch_size: 2000,
            sync_interval_seconds: 10,
            initial_block: 0,
        }
    }

    #[test]
    fn valid_settings_pass() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn empty_db_path_fails() {
        let mut s = valid_settings();
        s.db_path = String::new();
        let errors = s.validate().expect_err("expected validation failure");
        assert!(errors.iter().any(|e| e.contains("db_path")));
    }

    #[test]
    fn zero_batch_size_fails() {
        let mut s = valid_settings();
        s.sync_batch_size = 0;
        let errors = s.validate().expect_err("expected validation failure");
        assert!(errors.iter().any(|e| e.contains("sync_batch_size")));
    }
}

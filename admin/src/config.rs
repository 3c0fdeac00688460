//! Admin client configuration with TOML file support.

use reclaim_types::Identity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::AdminError;
use crate::policy::OWNER_ADDRESS;

/// Configuration for the admin client.
///
/// Can be loaded from a TOML file via [`AdminConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminConfig {
    /// JSON-RPC endpoint of the wallet node. Without it no wallet is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    /// Base URL of the reports backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Address of the deployed report contract. Required when `rpc_url` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    /// The identity allowed to administer reports.
    #[serde(default = "default_owner_address")]
    pub owner_address: String,

    /// How long to wait for a verification to be included.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// Interval between transaction receipt polls.
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Timeout for a single backend or RPC request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_backend_url() -> String {
    "https://reclaim-backend.onrender.com".to_string()
}

fn default_owner_address() -> String {
    OWNER_ADDRESS.to_string()
}

fn default_confirmation_timeout_secs() -> u64 {
    300
}

fn default_receipt_poll_interval_ms() -> u64 {
    2_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AdminConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, AdminError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AdminError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, AdminError> {
        toml::from_str(s).map_err(|e| AdminError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, AdminError> {
        toml::to_string_pretty(self).map_err(|e| AdminError::Config(e.to_string()))
    }

    /// Check the fields that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), AdminError> {
        self.owner_identity()?;
        let contract = self.contract_identity()?;
        if self.rpc_url.is_some() && contract.is_none() {
            return Err(AdminError::Config(
                "contract_address is required when rpc_url is set".into(),
            ));
        }
        if self.backend_url.trim().is_empty() {
            return Err(AdminError::Config("backend_url must not be empty".into()));
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(AdminError::Config(
                "confirmation_timeout_secs must be positive".into(),
            ));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(AdminError::Config(
                "receipt_poll_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn owner_identity(&self) -> Result<Identity, AdminError> {
        Identity::parse(self.owner_address.as_str())
            .map_err(|e| AdminError::Config(format!("owner_address: {e}")))
    }

    pub fn contract_identity(&self) -> Result<Option<Identity>, AdminError> {
        self.contract_address
            .as_deref()
            .map(|raw| {
                Identity::parse(raw)
                    .map_err(|e| AdminError::Config(format!("contract_address: {e}")))
            })
            .transpose()
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            backend_url: default_backend_url(),
            contract_address: None,
            owner_address: default_owner_address(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

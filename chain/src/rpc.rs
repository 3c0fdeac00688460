//! Ethereum JSON-RPC implementation of the wallet and contract seams.

use async_trait::async_trait;
use reclaim_types::{Identity, TxHash};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::abi::VerifyReportCall;
use crate::error::{ChainError, METHOD_NOT_FOUND_CODE, USER_REJECTED_CODE};
use crate::provider::{Receipt, ReportContract, Signer, WalletProvider};

/// Default timeout for a single JSON-RPC request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

// ── RpcClient ───────────────────────────────────────────────────────────

/// HTTP JSON-RPC 2.0 client.
///
/// Cheap to clone; clones share the connection pool and request id counter.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

impl RpcClient {
    /// Create a client for `url` (e.g. `http://127.0.0.1:8545`).
    pub fn new(url: impl Into<String>) -> Result<Self, ChainError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// The configured endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a request and decode its `result`. A missing result decodes as `null`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, id, "json-rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    ChainError::Unreachable(format!("connection failed: {e}"))
                } else {
                    ChainError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ChainError::Transport(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(format!("invalid JSON-RPC envelope: {e}")))?;

        if let Some(err) = envelope.error {
            return Err(if err.code == USER_REJECTED_CODE {
                ChainError::Rejected(err.message)
            } else {
                ChainError::Rpc {
                    code: err.code,
                    message: err.message,
                }
            });
        }

        let result = envelope.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(format!("{method}: {e}")))
    }
}

/// Parse a `0x`-prefixed hex quantity.
fn parse_quantity(s: &str) -> Result<u64, ChainError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidResponse(format!("quantity {s:?} missing 0x prefix")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("quantity {s:?}: {e}")))
}

// ── EthRpcProvider ──────────────────────────────────────────────────────

/// Wallet provider backed by a JSON-RPC endpoint that manages the operator's key.
pub struct EthRpcProvider {
    client: RpcClient,
    poll_interval: Duration,
}

impl EthRpcProvider {
    pub fn new(client: RpcClient) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the receipt polling interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn parse_accounts(raw: Vec<String>) -> Result<Vec<Identity>, ChainError> {
        raw.into_iter()
            .map(|a| Identity::parse(a).map_err(|e| ChainError::InvalidResponse(e.to_string())))
            .collect()
    }
}

#[async_trait]
impl WalletProvider for EthRpcProvider {
    async fn request_accounts(&self) -> Result<Vec<Identity>, ChainError> {
        let raw: Vec<String> = match self
            .client
            .call("eth_requestAccounts", serde_json::json!([]))
            .await
        {
            Ok(accounts) => accounts,
            // Plain nodes only know eth_accounts.
            Err(ChainError::Rpc { code, .. }) if code == METHOD_NOT_FOUND_CODE => {
                self.client.call("eth_accounts", serde_json::json!([])).await?
            }
            Err(e) => return Err(e),
        };
        let accounts = Self::parse_accounts(raw)?;
        if accounts.is_empty() {
            return Err(ChainError::NoAccounts);
        }
        Ok(accounts)
    }

    async fn signer(&self, account: &Identity) -> Result<Signer, ChainError> {
        Ok(Signer::new(account.clone()))
    }

    fn contract(
        &self,
        address: &Identity,
        signer: Signer,
    ) -> Result<Arc<dyn ReportContract>, ChainError> {
        Ok(Arc::new(RpcReportContract {
            client: self.client.clone(),
            address: address.clone(),
            signer,
            poll_interval: self.poll_interval,
        }))
    }
}

// ── RpcReportContract ───────────────────────────────────────────────────

/// Report contract handle that sends through `eth_sendTransaction`.
pub struct RpcReportContract {
    client: RpcClient,
    address: Identity,
    signer: Signer,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl RpcReportContract {
    fn decode_receipt(raw: RawReceipt) -> Result<Option<Receipt>, ChainError> {
        // Some nodes return a receipt skeleton for pending transactions.
        let Some(block_number) = raw.block_number else {
            return Ok(None);
        };
        let tx_hash = TxHash::parse(&raw.transaction_hash)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        if let Some(status) = raw.status.as_deref() {
            if parse_quantity(status)? == 0 {
                return Err(ChainError::Reverted(tx_hash));
            }
        }
        Ok(Some(Receipt {
            tx_hash,
            block_number: parse_quantity(&block_number)?,
        }))
    }
}

#[async_trait]
impl ReportContract for RpcReportContract {
    fn address(&self) -> &Identity {
        &self.address
    }

    fn signer(&self) -> &Signer {
        &self.signer
    }

    async fn verify_report(&self, call: &VerifyReportCall) -> Result<TxHash, ChainError> {
        let tx = serde_json::json!({
            "from": self.signer.account().to_lowercase(),
            "to": self.address.to_lowercase(),
            "value": call.value().to_hex_quantity(),
            "data": call.calldata_hex(),
        });
        let hash: String = self
            .client
            .call("eth_sendTransaction", serde_json::json!([tx]))
            .await?;
        let hash = TxHash::parse(&hash).map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        tracing::info!(report_id = %call.report_id(), tx = %hash, "verifyReport broadcast");
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, tx: TxHash) -> Result<Receipt, ChainError> {
        loop {
            let raw: Option<RawReceipt> = self
                .client
                .call(
                    "eth_getTransactionReceipt",
                    serde_json::json!([tx.to_string()]),
                )
                .await?;
            if let Some(receipt) = raw.map(Self::decode_receipt).transpose()?.flatten() {
                return Ok(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quantity_accepts_hex() {
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
    }

    #[test]
    fn parse_quantity_rejects_decimal() {
        assert!(parse_quantity("436").is_err());
    }

    #[test]
    fn envelope_with_error_deserializes() {
        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User rejected"}}"#;
        let env: RpcResponse = serde_json::from_str(json).unwrap();
        assert!(env.result.is_none());
        assert_eq!(env.error.unwrap().code, 4001);
    }

    #[test]
    fn receipt_without_block_is_pending() {
        let raw = RawReceipt {
            transaction_hash: format!("0x{}", "11".repeat(32)),
            block_number: None,
            status: None,
        };
        assert!(RpcReportContract::decode_receipt(raw).unwrap().is_none());
    }

    #[test]
    fn receipt_with_failed_status_is_revert() {
        let raw = RawReceipt {
            transaction_hash: format!("0x{}", "11".repeat(32)),
            block_number: Some("0x10".into()),
            status: Some("0x0".into()),
        };
        let err = RpcReportContract::decode_receipt(raw).unwrap_err();
        assert!(matches!(err, ChainError::Reverted(_)));
    }

    #[test]
    fn successful_receipt_decodes() {
        let raw = RawReceipt {
            transaction_hash: format!("0x{}", "11".repeat(32)),
            block_number: Some("0x10".into()),
            status: Some("0x1".into()),
        };
        let receipt = RpcReportContract::decode_receipt(raw).unwrap().unwrap();
        assert_eq!(receipt.block_number, 16);
    }

    #[test]
    fn client_creation() {
        let client = RpcClient::new("http://127.0.0.1:8545").unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:8545");
    }
}

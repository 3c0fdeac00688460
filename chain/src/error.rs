use reclaim_types::TxHash;
use thiserror::Error;

/// EIP-1193 code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// JSON-RPC code for "method not found".
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("request rejected by the wallet: {0}")]
    Rejected(String),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("wallet disclosed no accounts")]
    NoAccounts,

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("{0}")]
    Other(String),
}

impl ChainError {
    /// Whether the operator declined the request in their wallet.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

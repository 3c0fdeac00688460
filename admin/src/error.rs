use reclaim_backend::BackendError;
use reclaim_types::ReportId;
use thiserror::Error;

/// Failures surfaced to the operator.
///
/// Provider, backend and chain errors are converted into one of these at the
/// component that issued the call; raw transport errors never leave the crate.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("no wallet provider available")]
    ProviderUnavailable,

    #[error("wallet connection failed: {0}")]
    ConnectionFailed(String),

    #[error("fetching reports failed: {0}")]
    FetchFailed(String),

    #[error("no authorized wallet session")]
    NotReady,

    #[error("invalid reward amount: {0}")]
    InvalidAmount(String),

    #[error("verification transaction failed: {0}")]
    TransactionFailed(String),

    #[error("verification of report {0} is already in flight")]
    AlreadyPending(ReportId),

    #[error("config error: {0}")]
    Config(String),
}

impl AdminError {
    /// Operator-facing notification text, one per kind.
    pub fn notice(&self) -> String {
        match self {
            Self::ProviderUnavailable => {
                "No wallet provider found. Configure a wallet RPC endpoint (rpc_url) to connect."
                    .to_string()
            }
            Self::ConnectionFailed(reason) => {
                format!("Could not connect the admin wallet ({reason}). Please try again.")
            }
            Self::FetchFailed(reason) => {
                format!("Reports could not be refreshed ({reason}). Showing the last known list.")
            }
            Self::NotReady => {
                "Connect with an administrator wallet before verifying reports.".to_string()
            }
            Self::InvalidAmount(reason) => {
                format!("Verification cancelled: {reason}. Enter a positive ETH amount.")
            }
            Self::TransactionFailed(reason) => {
                format!("Failed to verify the report: {reason}")
            }
            Self::AlreadyPending(id) => {
                format!("Case #{id} already has a verification waiting for confirmation.")
            }
            Self::Config(reason) => format!("Configuration problem: {reason}"),
        }
    }
}

impl From<BackendError> for AdminError {
    fn from(e: BackendError) -> Self {
        Self::FetchFailed(e.to_string())
    }
}

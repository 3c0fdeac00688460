//! Wallet provider and contract traits.

use async_trait::async_trait;
use reclaim_types::{Identity, TxHash};
use std::sync::Arc;

use crate::abi::VerifyReportCall;
use crate::error::ChainError;

/// Signing capability for one disclosed account.
///
/// Opaque to callers: the key itself stays with the provider, which signs
/// on the account's behalf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signer {
    account: Identity,
}

impl Signer {
    pub fn new(account: Identity) -> Self {
        Self { account }
    }

    /// The account transactions are sent from.
    pub fn account(&self) -> &Identity {
        &self.account
    }
}

/// Inclusion receipt for a confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// A wallet that can disclose accounts and build signer-bound contract handles.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet to disclose its accounts. The first one is the active account.
    async fn request_accounts(&self) -> Result<Vec<Identity>, ChainError>;

    /// Obtain a signing capability for a disclosed account.
    async fn signer(&self, account: &Identity) -> Result<Signer, ChainError>;

    /// Bind the report contract at `address` to `signer`.
    fn contract(
        &self,
        address: &Identity,
        signer: Signer,
    ) -> Result<Arc<dyn ReportContract>, ChainError>;
}

/// The deployed report contract, bound to a signer.
#[async_trait]
pub trait ReportContract: Send + Sync {
    /// Contract address.
    fn address(&self) -> &Identity;

    /// Signer transactions are sent with.
    fn signer(&self) -> &Signer;

    /// Broadcast `verifyReport(id, reward)` with `value = reward`.
    ///
    /// Returns once the transaction is accepted for broadcast; inclusion is
    /// awaited separately with [`ReportContract::wait_for_confirmation`].
    async fn verify_report(&self, call: &VerifyReportCall) -> Result<TxHash, ChainError>;

    /// Wait until `tx` is included. A failed status is [`ChainError::Reverted`].
    ///
    /// Never times out on its own; callers bound it.
    async fn wait_for_confirmation(&self, tx: TxHash) -> Result<Receipt, ChainError>;
}

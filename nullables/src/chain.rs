//! Nullable chain: records `verifyReport` submissions, scripted confirmations.

use async_trait::async_trait;
use reclaim_chain::{ChainError, Receipt, ReportContract, Signer, VerifyReportCall};
use reclaim_types::{Identity, TxHash};
use std::sync::Mutex;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};

/// First block number handed out in receipts.
const FIRST_BLOCK: u64 = 100;

/// How submitted transactions get confirmed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfirmationMode {
    /// Included as soon as it is awaited.
    #[default]
    Immediate,
    /// Included with a failed status.
    Revert,
    /// Included only when the test calls [`NullChain::confirm`].
    Manual,
    /// Never included.
    Never,
}

/// One recorded `verifyReport` transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub from: Identity,
    pub to: Identity,
    pub call: VerifyReportCall,
    pub tx_hash: TxHash,
}

enum SubmitFailure {
    Rejected,
    Failed(String),
}

/// A simulated chain shared by every [`NullContract`] from one wallet.
pub struct NullChain {
    submissions: Mutex<Vec<Submission>>,
    failure: Mutex<Option<SubmitFailure>>,
    mode: Mutex<ConfirmationMode>,
    confirmations: Semaphore,
    submitted: watch::Sender<usize>,
    next_block: Mutex<u64>,
}

impl NullChain {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            mode: Mutex::new(ConfirmationMode::default()),
            confirmations: Semaphore::new(0),
            submitted: watch::channel(0).0,
            next_block: Mutex::new(FIRST_BLOCK),
        }
    }

    /// All submissions so far (for assertions).
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    /// The operator declines every following transaction in the wallet.
    pub fn reject_submissions(&self) {
        *self.failure.lock().unwrap() = Some(SubmitFailure::Rejected);
    }

    /// Every following submission fails with a provider error.
    pub fn fail_submissions_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(SubmitFailure::Failed(message.into()));
    }

    /// Accept submissions again.
    pub fn accept_submissions(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn set_confirmation_mode(&self, mode: ConfirmationMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Include `n` transactions waiting under [`ConfirmationMode::Manual`].
    pub fn confirm(&self, n: usize) {
        self.confirmations.add_permits(n);
    }

    /// Resolves once at least `n` transactions have been submitted.
    pub async fn wait_for_submissions(&self, n: usize) {
        let mut rx = self.submitted.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    fn submit(&self, from: &Identity, to: &Identity, call: &VerifyReportCall) -> Result<TxHash, ChainError> {
        match &*self.failure.lock().unwrap() {
            Some(SubmitFailure::Rejected) => {
                return Err(ChainError::Rejected("user denied transaction signature".into()))
            }
            Some(SubmitFailure::Failed(message)) => return Err(ChainError::Other(message.clone())),
            None => {}
        }
        let mut submissions = self.submissions.lock().unwrap();
        let mut hash = [0u8; 32];
        hash[0] = 0xab;
        hash[24..].copy_from_slice(&(submissions.len() as u64 + 1).to_be_bytes());
        let tx_hash = TxHash::new(hash);
        submissions.push(Submission {
            from: from.clone(),
            to: to.clone(),
            call: call.clone(),
            tx_hash,
        });
        let count = submissions.len();
        drop(submissions);
        self.submitted.send_replace(count);
        Ok(tx_hash)
    }

    async fn include(&self, tx_hash: TxHash) -> Result<Receipt, ChainError> {
        let mode = *self.mode.lock().unwrap();
        match mode {
            ConfirmationMode::Immediate => {}
            ConfirmationMode::Revert => return Err(ChainError::Reverted(tx_hash)),
            ConfirmationMode::Manual => {
                if let Ok(permit) = self.confirmations.acquire().await {
                    permit.forget();
                }
            }
            ConfirmationMode::Never => std::future::pending::<()>().await,
        }
        let mut next_block = self.next_block.lock().unwrap();
        let block_number = *next_block;
        *next_block += 1;
        Ok(Receipt {
            tx_hash,
            block_number,
        })
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Report contract handle backed by a [`NullChain`].
pub struct NullContract {
    address: Identity,
    signer: Signer,
    chain: Arc<NullChain>,
}

impl NullContract {
    pub fn new(address: Identity, signer: Signer, chain: Arc<NullChain>) -> Self {
        Self {
            address,
            signer,
            chain,
        }
    }
}

#[async_trait]
impl ReportContract for NullContract {
    fn address(&self) -> &Identity {
        &self.address
    }

    fn signer(&self) -> &Signer {
        &self.signer
    }

    async fn verify_report(&self, call: &VerifyReportCall) -> Result<TxHash, ChainError> {
        self.chain.submit(self.signer.account(), &self.address, call)
    }

    async fn wait_for_confirmation(&self, tx: TxHash) -> Result<Receipt, ChainError> {
        self.chain.include(tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_types::{ReportId, Wei};

    fn contract(chain: &Arc<NullChain>) -> NullContract {
        let from = Identity::parse("0x0000000000000000000000000000000000000001").unwrap();
        let to = Identity::parse("0x00000000000000000000000000000000000000c0").unwrap();
        NullContract::new(to, Signer::new(from), chain.clone())
    }

    fn call() -> VerifyReportCall {
        VerifyReportCall::new(ReportId::new(1), Wei::new(5))
    }

    #[tokio::test]
    async fn submissions_are_recorded_with_distinct_hashes() {
        let chain = Arc::new(NullChain::new());
        let c = contract(&chain);
        let a = c.verify_report(&call()).await.unwrap();
        let b = c.verify_report(&call()).await.unwrap();
        assert_ne!(a, b);
        let recorded = chain.submissions();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].call.value(), Wei::new(5));
        assert_eq!(recorded[0].from, *c.signer().account());
    }

    #[tokio::test]
    async fn rejected_submission_records_nothing() {
        let chain = Arc::new(NullChain::new());
        chain.reject_submissions();
        let err = contract(&chain).verify_report(&call()).await.unwrap_err();
        assert!(err.is_user_rejection());
        assert_eq!(chain.submission_count(), 0);
    }

    #[tokio::test]
    async fn receipts_advance_block_numbers() {
        let chain = Arc::new(NullChain::new());
        let c = contract(&chain);
        let tx = c.verify_report(&call()).await.unwrap();
        assert_eq!(c.wait_for_confirmation(tx).await.unwrap().block_number, FIRST_BLOCK);
        assert_eq!(c.wait_for_confirmation(tx).await.unwrap().block_number, FIRST_BLOCK + 1);
    }

    #[tokio::test]
    async fn manual_mode_waits_for_confirm() {
        let chain = Arc::new(NullChain::new());
        chain.set_confirmation_mode(ConfirmationMode::Manual);
        let c = contract(&chain);
        let tx = c.verify_report(&call()).await.unwrap();
        chain.confirm(1);
        assert_eq!(c.wait_for_confirmation(tx).await.unwrap().tx_hash, tx);
    }

    #[tokio::test]
    async fn revert_mode_reports_revert() {
        let chain = Arc::new(NullChain::new());
        chain.set_confirmation_mode(ConfirmationMode::Revert);
        let c = contract(&chain);
        let tx = c.verify_report(&call()).await.unwrap();
        assert!(matches!(
            c.wait_for_confirmation(tx).await,
            Err(ChainError::Reverted(h)) if h == tx
        ));
    }
}

//! Nullable wallet: scripted account disclosure, no keys.

use async_trait::async_trait;
use reclaim_chain::{ChainError, ReportContract, Signer, WalletProvider};
use reclaim_types::Identity;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::chain::{NullChain, NullContract};
use crate::gate::Gate;

/// A test wallet that discloses a configured account list.
///
/// Contract handles it builds share one [`NullChain`], reachable through
/// [`NullWalletProvider::chain`].
pub struct NullWalletProvider {
    accounts: Mutex<Vec<Identity>>,
    rejecting: AtomicBool,
    requests: Gate,
    chain: Arc<NullChain>,
}

impl NullWalletProvider {
    pub fn with_accounts(accounts: Vec<Identity>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            rejecting: AtomicBool::new(false),
            requests: Gate::new(),
            chain: Arc::new(NullChain::new()),
        }
    }

    pub fn with_account(account: Identity) -> Self {
        Self::with_accounts(vec![account])
    }

    /// A wallet whose user declines every account request.
    pub fn rejecting() -> Self {
        let provider = Self::with_accounts(Vec::new());
        provider.set_rejecting(true);
        provider
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Switch the active account, as a wallet does when the user picks another one.
    pub fn set_accounts(&self, accounts: Vec<Identity>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    /// The simulated chain every contract handle from this wallet talks to.
    pub fn chain(&self) -> Arc<NullChain> {
        self.chain.clone()
    }

    /// Hold account requests until [`NullWalletProvider::release_requests`].
    pub fn hold_requests(&self) {
        self.requests.hold();
    }

    pub fn release_requests(&self, n: usize) {
        self.requests.release(n);
    }

    /// Resolves once `n` account requests have arrived.
    pub async fn wait_for_requests(&self, n: usize) {
        self.requests.wait_for(n).await;
    }

    pub fn request_count(&self) -> usize {
        self.requests.arrivals()
    }
}

#[async_trait]
impl WalletProvider for NullWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Identity>, ChainError> {
        self.requests.pass().await;
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(ChainError::Rejected("user rejected the request".into()));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn signer(&self, account: &Identity) -> Result<Signer, ChainError> {
        Ok(Signer::new(account.clone()))
    }

    fn contract(
        &self,
        address: &Identity,
        signer: Signer,
    ) -> Result<Arc<dyn ReportContract>, ChainError> {
        Ok(Arc::new(NullContract::new(
            address.clone(),
            signer,
            self.chain.clone(),
        )))
    }
}

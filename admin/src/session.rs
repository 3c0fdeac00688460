//! Wallet session: connection lifecycle and derived authorization.
//!
//! The session is replaced wholesale on every change: readers only ever see a
//! complete [`SessionSnapshot`], never a half-connected one. Each replacement
//! advances the session epoch, which lets asynchronous work started under one
//! session detect that it has been superseded.

use reclaim_chain::{ReportContract, WalletProvider};
use reclaim_types::Identity;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::AdminError;
use crate::policy::AuthorizationPolicy;

/// Immutable view of the session at one epoch.
#[derive(Clone)]
pub struct SessionSnapshot {
    epoch: u64,
    address: Option<Identity>,
    authorized: bool,
    contract: Option<Arc<dyn ReportContract>>,
}

impl SessionSnapshot {
    fn empty(epoch: u64) -> Self {
        Self {
            epoch,
            address: None,
            authorized: false,
            contract: None,
        }
    }

    /// `authorized` is only ever computed here, from the address.
    fn connected(
        epoch: u64,
        address: Identity,
        contract: Arc<dyn ReportContract>,
        policy: &dyn AuthorizationPolicy,
    ) -> Self {
        let authorized = policy.is_authorized(&address);
        Self {
            epoch,
            address: Some(address),
            authorized,
            contract: Some(contract),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn address(&self) -> Option<&Identity> {
        self.address.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Contract handle, whether or not the session is authorized.
    pub fn contract(&self) -> Option<&Arc<dyn ReportContract>> {
        self.contract.as_ref()
    }

    /// Contract handle if the session may verify reports.
    pub fn authorized_contract(&self) -> Option<Arc<dyn ReportContract>> {
        if self.authorized {
            self.contract.clone()
        } else {
            None
        }
    }

    /// Same address and authorization, ignoring epoch.
    pub fn same_identity(&self, other: &SessionSnapshot) -> bool {
        self.address == other.address && self.authorized == other.authorized
    }
}

impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("epoch", &self.epoch)
            .field("address", &self.address)
            .field("authorized", &self.authorized)
            .field("contract", &self.contract.as_ref().map(|c| c.address().clone()))
            .finish()
    }
}

/// Owns the connection to the wallet provider.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    policy: Arc<dyn AuthorizationPolicy>,
    contract_address: Identity,
    state: RwLock<SessionSnapshot>,
}

impl WalletSession {
    /// `provider` is `None` when no wallet is available in this environment.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        contract_address: Identity,
        policy: Arc<dyn AuthorizationPolicy>,
    ) -> Self {
        Self {
            provider,
            policy,
            contract_address,
            state: RwLock::new(SessionSnapshot::empty(0)),
        }
    }

    /// Current session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }

    /// Connect to the wallet and derive authorization.
    ///
    /// On any failure the previous session stays in place. A connect that is
    /// overtaken by a disconnect or another connect while it awaits the
    /// provider is dropped with [`AdminError::ConnectionFailed`].
    pub async fn connect(&self) -> Result<SessionSnapshot, AdminError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(AdminError::ProviderUnavailable)?;
        let start_epoch = self.state.read().await.epoch;

        let accounts = provider
            .request_accounts()
            .await
            .map_err(|e| AdminError::ConnectionFailed(e.to_string()))?;
        let address = accounts
            .into_iter()
            .next()
            .ok_or_else(|| AdminError::ConnectionFailed("wallet disclosed no accounts".into()))?;
        let signer = provider
            .signer(&address)
            .await
            .map_err(|e| AdminError::ConnectionFailed(e.to_string()))?;
        let contract = provider
            .contract(&self.contract_address, signer)
            .map_err(|e| AdminError::ConnectionFailed(e.to_string()))?;

        let mut state = self.state.write().await;
        if state.epoch != start_epoch {
            return Err(AdminError::ConnectionFailed(
                "connection attempt superseded".into(),
            ));
        }
        *state = SessionSnapshot::connected(
            state.epoch + 1,
            address,
            contract,
            self.policy.as_ref(),
        );
        tracing::info!(
            address = %state.address.as_ref().map(|a| a.as_str()).unwrap_or_default(),
            authorized = state.authorized,
            epoch = state.epoch,
            "wallet connected"
        );
        Ok(state.clone())
    }

    /// Drop the session. Always succeeds; calling it again is harmless.
    pub async fn disconnect(&self) -> SessionSnapshot {
        let mut state = self.state.write().await;
        let was_connected = state.is_connected();
        // The epoch advances even when already empty so an in-flight connect is superseded.
        *state = SessionSnapshot::empty(state.epoch + 1);
        if was_connected {
            tracing::info!(epoch = state.epoch, "wallet disconnected");
        }
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{OwnerPolicy, OWNER_ADDRESS};
    use reclaim_nullables::NullWalletProvider;

    fn owner() -> Identity {
        Identity::parse(OWNER_ADDRESS).unwrap()
    }

    fn contract_address() -> Identity {
        Identity::parse("0x00000000000000000000000000000000000000c0").unwrap()
    }

    fn session(provider: Option<Arc<NullWalletProvider>>) -> WalletSession {
        WalletSession::new(
            provider.map(|p| p as Arc<dyn WalletProvider>),
            contract_address(),
            Arc::new(OwnerPolicy::new(owner())),
        )
    }

    #[tokio::test]
    async fn starts_empty() {
        let s = session(None).snapshot().await;
        assert!(!s.is_connected());
        assert!(!s.is_authorized());
        assert!(s.contract().is_none());
    }

    #[tokio::test]
    async fn missing_provider_is_provider_unavailable() {
        let err = session(None).connect().await.unwrap_err();
        assert!(matches!(err, AdminError::ProviderUnavailable));
    }

    #[tokio::test]
    async fn connect_as_owner_authorizes() {
        let provider = Arc::new(NullWalletProvider::with_account(owner()));
        let s = session(Some(provider)).connect().await.unwrap();
        assert!(s.is_authorized());
        assert_eq!(s.address(), Some(&owner()));
        assert_eq!(s.contract().unwrap().address(), &contract_address());
        assert_eq!(s.contract().unwrap().signer().account(), &owner());
    }

    #[tokio::test]
    async fn first_disclosed_account_is_used() {
        let other = Identity::parse("0x1111111111111111111111111111111111111111").unwrap();
        let provider = Arc::new(NullWalletProvider::with_accounts(vec![other.clone(), owner()]));
        let s = session(Some(provider)).connect().await.unwrap();
        assert_eq!(s.address(), Some(&other));
        assert!(!s.is_authorized());
    }

    #[tokio::test]
    async fn rejected_connect_leaves_session_empty() {
        let provider = Arc::new(NullWalletProvider::rejecting());
        let session = session(Some(provider));
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, AdminError::ConnectionFailed(_)));
        let s = session.snapshot().await;
        assert!(!s.is_connected());
        assert_eq!(s.epoch(), 0);
    }

    #[tokio::test]
    async fn no_accounts_is_connection_failed() {
        let provider = Arc::new(NullWalletProvider::with_accounts(Vec::new()));
        let err = session(Some(provider)).connect().await.unwrap_err();
        assert!(matches!(err, AdminError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn disconnect_resets_everything() {
        let provider = Arc::new(NullWalletProvider::with_account(owner()));
        let session = session(Some(provider));
        let connected = session.connect().await.unwrap();
        let s = session.disconnect().await;
        assert!(!s.is_connected());
        assert!(!s.is_authorized());
        assert!(s.contract().is_none());
        assert!(s.epoch() > connected.epoch());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let session = session(None);
        let a = session.disconnect().await;
        let b = session.disconnect().await;
        assert!(a.same_identity(&b));
        assert!(!b.is_connected());
    }

    #[tokio::test]
    async fn every_connect_advances_epoch() {
        let provider = Arc::new(NullWalletProvider::with_account(owner()));
        let session = session(Some(provider));
        let a = session.connect().await.unwrap();
        let b = session.connect().await.unwrap();
        assert!(b.epoch() > a.epoch());
        assert!(a.same_identity(&b));
    }

    #[tokio::test]
    async fn connect_superseded_by_disconnect_is_dropped() {
        let provider = Arc::new(NullWalletProvider::with_account(owner()));
        provider.hold_requests();
        let session = Arc::new(session(Some(provider.clone())));

        let connecting = {
            let session = session.clone();
            tokio::spawn(async move { session.connect().await })
        };
        provider.wait_for_requests(1).await;
        session.disconnect().await;
        provider.release_requests(1);

        let err = connecting.await.unwrap().unwrap_err();
        assert!(matches!(err, AdminError::ConnectionFailed(_)));
        assert!(!session.snapshot().await.is_connected());
    }
}

//! Session-scoped owner of all admin state.

use reclaim_backend::{HttpReportSource, ReportSource};
use reclaim_chain::{EthRpcProvider, RpcClient, WalletProvider};
use reclaim_types::{Identity, Report, ReportId};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AdminConfig;
use crate::error::AdminError;
use crate::policy::OwnerPolicy;
use crate::preview::EvidencePreview;
use crate::registry::WorkflowState;
use crate::report_store::{ReportStore, SyncOutcome};
use crate::session::{SessionSnapshot, WalletSession};
use crate::verification::{AmountPrompt, VerificationOutcome, VerificationWorkflow};

/// Placeholder contract address used when no wallet is configured.
const NO_CONTRACT: &str = "0x0000000000000000000000000000000000000000";

/// Result of a successful connect: the new session plus the report sync it triggered.
#[derive(Debug)]
pub struct ConnectOutcome {
    pub session: SessionSnapshot,
    pub sync: Result<SyncOutcome, AdminError>,
}

pub struct AdminContext {
    session: WalletSession,
    reports: ReportStore,
    workflow: VerificationWorkflow,
    preview: Mutex<EvidencePreview>,
}

impl AdminContext {
    pub fn new(session: WalletSession, reports: ReportStore, workflow: VerificationWorkflow) -> Self {
        Self {
            session,
            reports,
            workflow,
            preview: Mutex::new(EvidencePreview::new()),
        }
    }

    /// Build from config with explicit wallet and backend boundaries.
    pub fn with_boundaries(
        config: &AdminConfig,
        provider: Option<Arc<dyn WalletProvider>>,
        source: Arc<dyn ReportSource>,
    ) -> Result<Self, AdminError> {
        let owner = config.owner_identity()?;
        let contract = match config.contract_identity()? {
            Some(address) => address,
            None => Identity::parse(NO_CONTRACT).map_err(|e| AdminError::Config(e.to_string()))?,
        };
        let session = WalletSession::new(provider, contract, Arc::new(OwnerPolicy::new(owner)));
        Ok(Self::new(
            session,
            ReportStore::new(source),
            VerificationWorkflow::new(config.confirmation_timeout()),
        ))
    }

    /// Build the production context: JSON-RPC wallet (if `rpc_url` is set) and HTTP backend.
    pub fn from_config(config: &AdminConfig) -> Result<Self, AdminError> {
        config.validate()?;
        let provider = match &config.rpc_url {
            Some(url) => {
                let client = RpcClient::with_timeout(url.clone(), config.request_timeout())
                    .map_err(|e| AdminError::Config(e.to_string()))?;
                let provider = EthRpcProvider::new(client)
                    .with_poll_interval(config.receipt_poll_interval());
                Some(Arc::new(provider) as Arc<dyn WalletProvider>)
            }
            None => None,
        };
        let source = HttpReportSource::with_timeout(config.backend_url.clone(), config.request_timeout())
            .map_err(|e| AdminError::Config(e.to_string()))?;
        Self::with_boundaries(config, provider, Arc::new(source))
    }

    /// Connect the wallet, then bring the report list in line with the new session.
    ///
    /// Verifications started under the previous session are abandoned. A sync
    /// failure does not undo the connect; it is reported in [`ConnectOutcome::sync`].
    pub async fn connect(&self) -> Result<ConnectOutcome, AdminError> {
        let session = self.session.connect().await?;
        let abandoned = self.workflow.registry().abandon_before(session.epoch());
        if abandoned > 0 {
            tracing::info!(abandoned, "session replaced; pending verifications abandoned");
        }
        let sync = self.reports.sync(&self.session).await;
        Ok(ConnectOutcome { session, sync })
    }

    /// Drop the session, abandon pending confirmations and clear the report list.
    pub async fn disconnect(&self) -> SessionSnapshot {
        let session = self.session.disconnect().await;
        let abandoned = self.workflow.registry().abandon_before(session.epoch());
        if abandoned > 0 {
            tracing::info!(abandoned, "disconnected; pending verifications abandoned");
        }
        self.reports.clear().await;
        session
    }

    pub async fn session(&self) -> SessionSnapshot {
        self.session.snapshot().await
    }

    pub async fn sync_reports(&self) -> Result<SyncOutcome, AdminError> {
        self.reports.sync(&self.session).await
    }

    /// Reports visible to the current session.
    pub async fn reports(&self) -> Vec<Report> {
        let session = self.session.snapshot().await;
        self.reports.reports(&session).await
    }

    pub async fn report(&self, id: ReportId) -> Option<Report> {
        let session = self.session.snapshot().await;
        self.reports.get(&session, id).await
    }

    /// Verify one report, then re-sync if the session that started it is still current.
    pub async fn verify_report(
        &self,
        id: ReportId,
        prompt: &mut dyn AmountPrompt,
    ) -> Result<VerificationOutcome, AdminError> {
        let session = self.session.snapshot().await;
        let outcome = self.workflow.run(&session, id, prompt).await?;
        match outcome {
            VerificationOutcome::Confirmed {
                report_id,
                tx_hash,
                block_number,
                ..
            } => {
                let current = self.session.snapshot().await;
                let refreshed = if current.epoch() == session.epoch() {
                    match self.reports.sync(&self.session).await {
                        Ok(SyncOutcome::Replaced { .. }) => true,
                        Ok(_) => false,
                        Err(e) => {
                            tracing::warn!(report_id = %report_id, error = %e, "re-sync after verification failed");
                            false
                        }
                    }
                } else {
                    false
                };
                Ok(VerificationOutcome::Confirmed {
                    report_id,
                    tx_hash,
                    block_number,
                    refreshed,
                })
            }
            abandoned @ VerificationOutcome::Abandoned { .. } => Ok(abandoned),
        }
    }

    pub fn workflow_state(&self, id: ReportId) -> WorkflowState {
        self.workflow.state(id)
    }

    /// Show `link`, or hide it if it is the one currently shown.
    pub async fn toggle_evidence(&self, link: &str) -> Option<String> {
        let mut preview = self.preview.lock().await;
        preview.toggle(link);
        preview.shown().map(str::to_string)
    }

    pub async fn shown_evidence(&self) -> Option<String> {
        self.preview.lock().await.shown().map(str::to_string)
    }
}

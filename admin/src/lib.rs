//! Admin session core for the Reclaim portal.
//!
//! Everything is owned by a session-scoped [`AdminContext`]:
//! - [`WalletSession`]: wallet connection, derived owner authorization
//! - [`ReportStore`]: report collection, only populated while authorized
//! - [`VerificationWorkflow`]: `verifyReport` transaction, confirmation, re-sync
//! - [`EvidencePreview`]: the single "currently shown" evidence link
//!
//! Flow: connect → authorization → report sync → operator verifies a report →
//! confirmation → report re-sync. Reports are never patched locally; verified
//! state always comes from the backend.

pub mod config;
pub mod context;
pub mod error;
pub mod policy;
pub mod preview;
pub mod registry;
pub mod report_store;
pub mod session;
pub mod verification;

pub use config::AdminConfig;
pub use context::{AdminContext, ConnectOutcome};
pub use error::AdminError;
pub use policy::{AuthorizationPolicy, OwnerPolicy, OWNER_ADDRESS};
pub use preview::EvidencePreview;
pub use registry::{ConfirmationRegistry, InFlight, WorkflowState};
pub use report_store::{ReportStore, SyncOutcome};
pub use session::{SessionSnapshot, WalletSession};
pub use verification::{AmountPrompt, FixedAmount, VerificationOutcome, VerificationWorkflow};

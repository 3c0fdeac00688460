//! Verification workflow: `Idle → AmountRequested → Submitted → Confirmed | Failed`.
//!
//! One invocation verifies one report: the operator supplies a reward, the
//! workflow sends `verifyReport(id, reward)` paying the reward as the
//! transaction value, and waits for inclusion. It never edits reports; the
//! caller re-syncs the store after confirmation.

use async_trait::async_trait;
use reclaim_chain::VerifyReportCall;
use reclaim_types::{ReportId, TxHash, Wei};
use std::time::Duration;

use crate::error::AdminError;
use crate::registry::{ConfirmationRegistry, WorkflowState};
use crate::session::SessionSnapshot;

/// Default bound on waiting for inclusion.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Source of the operator's reward amount.
#[async_trait]
pub trait AmountPrompt: Send {
    /// Ask for the reward for `report_id`, in ETH. `None` means cancelled.
    async fn request_amount(&mut self, report_id: ReportId) -> Option<String>;
}

/// A prompt that answers with a preset value.
#[derive(Clone, Debug)]
pub struct FixedAmount(Option<String>);

impl FixedAmount {
    pub fn new(amount: impl Into<String>) -> Self {
        Self(Some(amount.into()))
    }

    pub fn cancelled() -> Self {
        Self(None)
    }
}

#[async_trait]
impl AmountPrompt for FixedAmount {
    async fn request_amount(&mut self, _report_id: ReportId) -> Option<String> {
        self.0.clone()
    }
}

/// How a verification ended, when it did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Included on chain. `refreshed` tells whether the report list was re-synced.
    Confirmed {
        report_id: ReportId,
        tx_hash: TxHash,
        block_number: u64,
        refreshed: bool,
    },
    /// The session ended while waiting. The transaction may still be included.
    Abandoned { report_id: ReportId, tx_hash: TxHash },
}

/// Turn operator input into a positive reward.
pub fn parse_reward(input: Option<&str>) -> Result<Wei, AdminError> {
    let input = input.ok_or_else(|| AdminError::InvalidAmount("no amount entered".into()))?;
    let amount =
        Wei::from_ether_str(input).map_err(|e| AdminError::InvalidAmount(e.to_string()))?;
    if amount.is_zero() {
        return Err(AdminError::InvalidAmount(
            "reward must be greater than zero".into(),
        ));
    }
    Ok(amount)
}

pub struct VerificationWorkflow {
    registry: ConfirmationRegistry,
    confirmation_timeout: Duration,
}

impl VerificationWorkflow {
    pub fn new(confirmation_timeout: Duration) -> Self {
        Self {
            registry: ConfirmationRegistry::new(),
            confirmation_timeout,
        }
    }

    pub fn registry(&self) -> &ConfirmationRegistry {
        &self.registry
    }

    pub fn state(&self, report_id: ReportId) -> WorkflowState {
        self.registry.state(report_id)
    }

    /// Run one verification under `session`.
    ///
    /// Refused with [`AdminError::NotReady`] before prompting when the session
    /// cannot verify. Any error leaves the report as it was; nothing is retried.
    pub async fn run(
        &self,
        session: &SessionSnapshot,
        report_id: ReportId,
        prompt: &mut dyn AmountPrompt,
    ) -> Result<VerificationOutcome, AdminError> {
        let contract = session.authorized_contract().ok_or(AdminError::NotReady)?;
        let mut in_flight = self.registry.begin(report_id, session.epoch())?;
        if in_flight.is_abandoned() {
            return Err(AdminError::NotReady);
        }

        let input = prompt.request_amount(report_id).await;
        let reward = parse_reward(input.as_deref())?;
        if in_flight.is_abandoned() {
            return Err(AdminError::NotReady);
        }

        let call = VerifyReportCall::new(report_id, reward);
        let tx_hash = contract.verify_report(&call).await.map_err(|e| {
            tracing::warn!(report_id = %report_id, error = %e, "verifyReport submission failed");
            AdminError::TransactionFailed(e.to_string())
        })?;
        in_flight.submitted(tx_hash);
        tracing::info!(report_id = %report_id, tx = %tx_hash, reward = %reward, "verification submitted");

        let confirmation =
            tokio::time::timeout(self.confirmation_timeout, contract.wait_for_confirmation(tx_hash));
        tokio::select! {
            result = confirmation => match result {
                Ok(Ok(receipt)) => {
                    tracing::info!(report_id = %report_id, tx = %tx_hash, block = receipt.block_number, "verification confirmed");
                    Ok(VerificationOutcome::Confirmed {
                        report_id,
                        tx_hash,
                        block_number: receipt.block_number,
                        refreshed: false,
                    })
                }
                Ok(Err(e)) => {
                    tracing::warn!(report_id = %report_id, tx = %tx_hash, error = %e, "verification failed");
                    Err(AdminError::TransactionFailed(e.to_string()))
                }
                Err(_) => {
                    tracing::warn!(report_id = %report_id, tx = %tx_hash, "confirmation timed out");
                    Err(AdminError::TransactionFailed(format!(
                        "no confirmation for {tx_hash} within {}s",
                        self.confirmation_timeout.as_secs()
                    )))
                }
            },
            _ = in_flight.abandoned() => {
                Ok(VerificationOutcome::Abandoned { report_id, tx_hash })
            }
        }
    }
}

impl Default for VerificationWorkflow {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRMATION_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reward_accepts_positive_decimal() {
        assert_eq!(
            parse_reward(Some("0.2")).unwrap(),
            Wei::new(200_000_000_000_000_000)
        );
    }

    #[test]
    fn parse_reward_rejects_cancel_zero_negative_garbage() {
        for input in [None, Some("0"), Some("0.000"), Some("-1"), Some("abc"), Some("")] {
            let err = parse_reward(input).unwrap_err();
            assert!(matches!(err, AdminError::InvalidAmount(_)), "{input:?}");
        }
    }

    #[tokio::test]
    async fn fixed_amount_prompt() {
        let mut p = FixedAmount::new("1.5");
        assert_eq!(p.request_amount(ReportId::new(1)).await.as_deref(), Some("1.5"));
        let mut c = FixedAmount::cancelled();
        assert_eq!(c.request_amount(ReportId::new(1)).await, None);
    }
}

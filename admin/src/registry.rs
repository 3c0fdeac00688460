//! In-flight verification registry, keyed by report id.
//!
//! Each running workflow holds an [`InFlight`] guard. The registry lets a
//! disconnect mark every in-flight confirmation as abandoned: the waiting task
//! stops waiting and skips its follow-up, while the broadcast transaction
//! itself is left alone (it cannot be recalled).

use reclaim_types::{ReportId, TxHash};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::error::AdminError;

/// Where a report's verification currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    AmountRequested,
    Submitted(TxHash),
}

struct Entry {
    token: u64,
    /// Session epoch the verification was started under.
    epoch: u64,
    state: WorkflowState,
    abandon: watch::Sender<bool>,
}

#[derive(Default)]
struct Inner {
    next_token: u64,
    /// Verifications started under an earlier epoch are abandoned on arrival.
    floor: u64,
    entries: HashMap<ReportId, Entry>,
}

/// Registry of running verifications. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct ConfirmationRegistry {
    inner: Arc<Mutex<Inner>>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // Entries are plain data; a panic mid-update cannot leave them inconsistent.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConfirmationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new verification for `id`, started under session `epoch`.
    pub fn begin(&self, id: ReportId, epoch: u64) -> Result<InFlight, AdminError> {
        let mut inner = lock(&self.inner);
        if inner.entries.contains_key(&id) {
            return Err(AdminError::AlreadyPending(id));
        }
        inner.next_token += 1;
        let token = inner.next_token;
        let (abandon, abandoned) = watch::channel(epoch < inner.floor);
        inner.entries.insert(
            id,
            Entry {
                token,
                epoch,
                state: WorkflowState::AmountRequested,
                abandon,
            },
        );
        Ok(InFlight {
            registry: self.inner.clone(),
            id,
            token,
            abandoned,
        })
    }

    /// Current state for `id`; `Idle` when nothing is running.
    pub fn state(&self, id: ReportId) -> WorkflowState {
        lock(&self.inner)
            .entries
            .get(&id)
            .map(|e| e.state)
            .unwrap_or(WorkflowState::Idle)
    }

    /// Number of running verifications.
    pub fn in_flight(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    /// Mark every verification started before session `epoch` as abandoned.
    /// Returns how many were marked.
    pub fn abandon_before(&self, epoch: u64) -> usize {
        let mut inner = lock(&self.inner);
        inner.floor = inner.floor.max(epoch);
        let mut abandoned = 0;
        for (id, entry) in inner.entries.iter().filter(|(_, e)| e.epoch < epoch) {
            if let WorkflowState::Submitted(tx) = entry.state {
                tracing::warn!(report_id = %id, tx = %tx, "abandoning confirmation wait; transaction stays broadcast");
            }
            entry.abandon.send_replace(true);
            abandoned += 1;
        }
        abandoned
    }
}

/// Guard for one running verification. Dropping it returns the report to `Idle`.
pub struct InFlight {
    registry: Arc<Mutex<Inner>>,
    id: ReportId,
    token: u64,
    abandoned: watch::Receiver<bool>,
}

impl InFlight {
    pub fn report_id(&self) -> ReportId {
        self.id
    }

    /// Record that the transaction was broadcast.
    pub fn submitted(&self, tx: TxHash) {
        let mut inner = lock(&self.registry);
        if let Some(entry) = inner.entries.get_mut(&self.id) {
            if entry.token == self.token {
                entry.state = WorkflowState::Submitted(tx);
            }
        }
    }

    pub fn is_abandoned(&self) -> bool {
        *self.abandoned.borrow()
    }

    /// Resolves once the registry abandons this verification.
    pub async fn abandoned(&mut self) {
        let closed = self.abandoned.wait_for(|abandoned| *abandoned).await.is_err();
        if closed {
            // Sender lives in our own entry; this only happens if it was removed under us.
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut inner = lock(&self.registry);
        if inner.entries.get(&self.id).is_some_and(|e| e.token == self.token) {
            inner.entries.remove(&self.id);
        }
    }
}

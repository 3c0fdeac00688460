//! Report collection, gated on session authorization.
//!
//! The stored collection is tagged with the session epoch it was fetched
//! under. It is only visible while that epoch is current and authorized, so
//! no report data can be observed without an authorized session.

use reclaim_backend::ReportSource;
use reclaim_types::{Report, ReportId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::AdminError;
use crate::session::{SessionSnapshot, WalletSession};

/// What a sync did to the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The collection was replaced with a fresh listing.
    Replaced { count: usize },
    /// The session is not authorized; the collection was emptied.
    Cleared,
    /// The session changed while fetching (or a newer sync already landed);
    /// the listing was dropped.
    Discarded,
}

#[derive(Default)]
struct Collection {
    epoch: u64,
    /// Sequence number of the sync that produced `reports`.
    seq: u64,
    reports: Vec<Report>,
}

/// Holds the cached report collection. Only [`ReportStore::sync`] and
/// [`ReportStore::clear`] write it.
pub struct ReportStore {
    source: Arc<dyn ReportSource>,
    collection: RwLock<Collection>,
    next_seq: AtomicU64,
}

impl ReportStore {
    pub fn new(source: Arc<dyn ReportSource>) -> Self {
        Self {
            source,
            collection: RwLock::new(Collection::default()),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Bring the collection in line with the session.
    ///
    /// Authorized: fetch and replace, unless the session epoch moved or
    /// authorization was lost during the fetch. Unauthorized: clear.
    /// A failed fetch leaves the previous collection untouched.
    pub async fn sync(&self, session: &WalletSession) -> Result<SyncOutcome, AdminError> {
        let before = session.snapshot().await;
        if !before.is_authorized() {
            self.clear().await;
            return Ok(SyncOutcome::Cleared);
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let fetched = self.source.list_reports().await;

        // Checked under the collection lock: a disconnect advances the epoch
        // before it clears, so a stale listing can never land after the clear.
        let mut collection = self.collection.write().await;
        let now = session.snapshot().await;
        if now.epoch() != before.epoch() || !now.is_authorized() {
            tracing::debug!(
                fetched_epoch = before.epoch(),
                current_epoch = now.epoch(),
                "discarding report listing from superseded session"
            );
            return Ok(SyncOutcome::Discarded);
        }
        if collection.epoch == now.epoch() && collection.seq > seq {
            return Ok(SyncOutcome::Discarded);
        }

        match fetched {
            Ok(reports) => {
                let count = reports.len();
                collection.epoch = now.epoch();
                collection.seq = seq;
                collection.reports = reports;
                tracing::info!(count, epoch = now.epoch(), "report collection replaced");
                Ok(SyncOutcome::Replaced { count })
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch reports; keeping previous collection");
                Err(AdminError::from(e))
            }
        }
    }

    /// Empty the collection.
    pub async fn clear(&self) {
        let mut collection = self.collection.write().await;
        collection.reports.clear();
        collection.seq = 0;
    }

    /// Reports visible to `session`: empty unless authorized and current.
    pub async fn reports(&self, session: &SessionSnapshot) -> Vec<Report> {
        if !session.is_authorized() {
            return Vec::new();
        }
        let collection = self.collection.read().await;
        if collection.epoch != session.epoch() {
            return Vec::new();
        }
        collection.reports.clone()
    }

    /// One visible report by id.
    pub async fn get(&self, session: &SessionSnapshot, id: ReportId) -> Option<Report> {
        if !session.is_authorized() {
            return None;
        }
        let collection = self.collection.read().await;
        if collection.epoch != session.epoch() {
            return None;
        }
        collection.reports.iter().find(|r| r.id == id).cloned()
    }
}

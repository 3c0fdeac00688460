//! Nullable backend: serves an in-memory report listing.

use async_trait::async_trait;
use reclaim_backend::{BackendError, ReportSource};
use reclaim_types::Report;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::gate::Gate;

/// A test backend. The listing is read when a fetch is let through, so a
/// held fetch returns whatever the listing is at release time.
pub struct NullReportSource {
    reports: Mutex<Vec<Report>>,
    failures: Mutex<VecDeque<String>>,
    fetches: Gate,
}

impl NullReportSource {
    pub fn new() -> Self {
        Self::with_reports(Vec::new())
    }

    pub fn with_reports(reports: Vec<Report>) -> Self {
        Self {
            reports: Mutex::new(reports),
            failures: Mutex::new(VecDeque::new()),
            fetches: Gate::new(),
        }
    }

    /// Replace the listing served by the next fetches.
    pub fn set_reports(&self, reports: Vec<Report>) {
        *self.reports.lock().unwrap() = reports;
    }

    /// Make the next fetch fail. Queued failures are consumed in order.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.failures.lock().unwrap().push_back(message.into());
    }

    /// Hold fetches until [`NullReportSource::release_fetches`].
    pub fn hold_fetches(&self) {
        self.fetches.hold();
    }

    pub fn release_fetches(&self, n: usize) {
        self.fetches.release(n);
    }

    /// Resolves once `n` fetches have started.
    pub async fn wait_for_fetches(&self, n: usize) {
        self.fetches.wait_for(n).await;
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.arrivals()
    }
}

impl Default for NullReportSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSource for NullReportSource {
    async fn list_reports(&self) -> Result<Vec<Report>, BackendError> {
        self.fetches.pass().await;
        if let Some(message) = self.failures.lock().unwrap().pop_front() {
            return Err(BackendError::RequestFailed(message));
        }
        Ok(self.reports.lock().unwrap().clone())
    }
}

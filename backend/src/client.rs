//! HTTP client for the backend report listing.

use async_trait::async_trait;
use reclaim_types::Report;
use std::time::Duration;

use crate::error::BackendError;

/// Path of the report listing endpoint, relative to the backend base URL.
pub const REPORTS_PATH: &str = "/api/reports";

/// Default timeout for backend requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can list the current reports.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Fetch the full report collection, in backend order.
    async fn list_reports(&self) -> Result<Vec<Report>, BackendError>;
}

/// Client for the backend's report endpoint.
///
/// Sends `GET {base_url}/api/reports` and parses the JSON array.
pub struct HttpReportSource {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpReportSource {
    /// Create a client with default timeout settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::RequestFailed(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Full URL of the listing endpoint.
    pub fn reports_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), REPORTS_PATH)
    }
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn list_reports(&self) -> Result<Vec<Report>, BackendError> {
        let url = self.reports_url();

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                BackendError::Unreachable(format!("connection failed: {e}"))
            } else {
                BackendError::RequestFailed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(BackendError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let reports: Vec<Report> = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("failed to parse report listing: {e}"))
        })?;
        tracing::debug!(count = reports.len(), "fetched reports");
        Ok(reports)
    }
}

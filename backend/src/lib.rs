//! Backend report store boundary.
//!
//! The backend owns the report records; the admin client only reads them:
//! - `GET /api/reports` → JSON array of reports
//!
//! Verification results are not written back from the client. The backend
//! observes the contract itself and reflects verified reports on the next listing.

pub mod client;
pub mod error;

pub use client::{HttpReportSource, ReportSource, REPORTS_PATH};
pub use error::BackendError;

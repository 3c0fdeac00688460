use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),

    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

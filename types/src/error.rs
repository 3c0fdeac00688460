//! Error type for parsing and validating the shared types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount overflows 128-bit wei")]
    AmountOverflow,

    #[error("invalid report id: {0}")]
    InvalidReportId(String),

    #[error("invalid transaction hash: {0}")]
    InvalidTxHash(String),
}

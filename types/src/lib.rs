//! Fundamental types for the Reclaim admin client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identities, report records, native-currency amounts and transaction hashes.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod report;

pub use address::Identity;
pub use amount::Wei;
pub use error::TypesError;
pub use hash::TxHash;
pub use report::{Report, ReportId};

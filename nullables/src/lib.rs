//! Nullable infrastructure for deterministic testing.
//!
//! The wallet, contract and backend boundaries are traits; this crate provides
//! in-memory implementations that:
//! - Return scripted values
//! - Record what was sent to them (for assertions)
//! - Can be held at a request and released programmatically, to stage races
//! - Never touch the network
//!
//! Usage: hand these to the admin context in place of the JSON-RPC provider
//! and the HTTP backend.

pub mod backend;
pub mod chain;
mod gate;
pub mod wallet;

pub use backend::NullReportSource;
pub use chain::{ConfirmationMode, NullChain, NullContract, Submission};
pub use wallet::NullWalletProvider;

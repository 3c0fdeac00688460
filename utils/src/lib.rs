//! Shared utilities for the Reclaim admin client.

pub mod logging;

pub use logging::{init_logging, LogFormat};

//! Blockchain boundary for the Reclaim admin client.
//!
//! Two seams are defined here:
//! - [`WalletProvider`]: account disclosure and signer/contract construction
//!   (the role an injected browser wallet plays).
//! - [`ReportContract`]: the deployed report contract with its single payable
//!   method `verifyReport(uint256 id, uint256 reward)`.
//!
//! [`EthRpcProvider`] implements both over Ethereum JSON-RPC, for nodes or
//! wallet bridges that hold the operator's key and sign `eth_sendTransaction`.

pub mod abi;
pub mod error;
pub mod provider;
pub mod rpc;

pub use abi::{selector, VerifyReportCall, VERIFY_REPORT_SIGNATURE};
pub use error::ChainError;
pub use provider::{Receipt, ReportContract, Signer, WalletProvider};
pub use rpc::{EthRpcProvider, RpcClient, RpcReportContract};

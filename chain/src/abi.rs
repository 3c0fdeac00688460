//! Calldata encoding for the report contract.

use reclaim_types::{ReportId, Wei};
use sha3::{Digest, Keccak256};

/// Canonical signature of the contract's verification method.
pub const VERIFY_REPORT_SIGNATURE: &str = "verifyReport(uint256,uint256)";

/// 4-byte function selector: the first bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// A `verifyReport` invocation.
///
/// The reward is both the second call argument and the transaction value:
/// the reward is paid, not merely recorded. Only one amount is stored, so
/// the two cannot diverge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyReportCall {
    report_id: ReportId,
    reward: Wei,
}

impl VerifyReportCall {
    pub fn new(report_id: ReportId, reward: Wei) -> Self {
        Self { report_id, reward }
    }

    pub fn report_id(&self) -> ReportId {
        self.report_id
    }

    /// The `rewardAmount` argument.
    pub fn reward(&self) -> Wei {
        self.reward
    }

    /// The value attached to the transaction.
    pub fn value(&self) -> Wei {
        self.reward
    }

    /// ABI-encoded calldata: selector followed by two `uint256` words.
    pub fn calldata(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + 64);
        data.extend_from_slice(&selector(VERIFY_REPORT_SIGNATURE));
        data.extend_from_slice(&self.report_id.to_abi_word());
        data.extend_from_slice(&self.reward.to_abi_word());
        data
    }

    /// Calldata as a `0x`-prefixed hex string.
    pub fn calldata_hex(&self) -> String {
        format!("0x{}", hex::encode(self.calldata()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_keccak_not_sha3() {
        // ERC-20 transfer selector is the well-known 0xa9059cbb.
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn value_always_matches_reward() {
        let call = VerifyReportCall::new(ReportId::new(1), Wei::from_ether_str("0.2").unwrap());
        assert_eq!(call.value(), call.reward());
    }

    #[test]
    fn calldata_layout() {
        let reward = Wei::from_ether_str("0.2").unwrap();
        let call = VerifyReportCall::new(ReportId::new(1), reward);
        let data = call.calldata();
        assert_eq!(data.len(), 68);
        assert_eq!(&data[..4], &selector(VERIFY_REPORT_SIGNATURE));
        assert_eq!(data[35], 1);
        assert_eq!(&data[36..], &reward.to_abi_word());
    }

    #[test]
    fn calldata_hex_is_prefixed() {
        let call = VerifyReportCall::new(ReportId::new(3), Wei::new(1));
        let hex = call.calldata_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 2 + 68 * 2);
    }
}

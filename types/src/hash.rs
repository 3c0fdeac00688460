//! Transaction hash type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// A 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a `0x`-prefixed 64-digit hex string.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| TypesError::InvalidTxHash(format!("{s}: missing 0x prefix")))?;
        let bytes = hex::decode(digits).map_err(|e| TypesError::InvalidTxHash(format!("{s}: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidTxHash(format!("{s}: expected 32 bytes")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for TxHash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TxHash {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TxHash> for String {
    fn from(h: TxHash) -> Self {
        h.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_then_parse() {
        let h = TxHash::new([0xab; 32]);
        let s = h.to_string();
        assert!(s.starts_with("0xabab"));
        assert_eq!(TxHash::parse(&s).unwrap(), h);
    }

    #[test]
    fn rejects_short_hash() {
        assert!(TxHash::parse("0xabcd").is_err());
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(TxHash::parse(&"ab".repeat(32)).is_err());
    }
}

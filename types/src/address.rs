//! Account identity type with `0x` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::TypesError;

/// An EVM account address, always `0x` followed by 40 hex digits.
///
/// The casing the wallet disclosed is kept for display (checksummed addresses
/// are mixed case), but equality and hashing ignore ASCII case: two identities
/// that differ only in letter case name the same account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// The standard prefix for all account addresses.
    pub const PREFIX: &'static str = "0x";

    /// Number of hex digits after the prefix.
    pub const HEX_LEN: usize = 40;

    /// Parse and validate an address string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        let s = s.trim().to_string();
        let digits = s
            .strip_prefix(Self::PREFIX)
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidAddress(format!("{s}: missing 0x prefix")))?;
        if digits.len() != Self::HEX_LEN {
            return Err(TypesError::InvalidAddress(format!(
                "{s}: expected {} hex digits, got {}",
                Self::HEX_LEN,
                digits.len()
            )));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypesError::InvalidAddress(format!("{s}: non-hex digit")));
        }
        Ok(Self(format!("{}{}", Self::PREFIX, digits)))
    }

    /// Return the address string as disclosed.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form, used on the wire where providers expect it.
    pub fn to_lowercase(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// The 20 raw address bytes.
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        // Validated on construction, so decoding cannot fail.
        if let Ok(bytes) = hex::decode(&self.0[Self::PREFIX.len()..]) {
            out.copy_from_slice(&bytes);
        }
        out
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identity {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0
    }
}

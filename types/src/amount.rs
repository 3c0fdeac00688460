//! Native-currency amounts.
//!
//! Amounts are represented as integer wei (u128) to avoid floating-point errors.
//! One ether is 10^18 wei. Human input such as `"0.2"` is converted exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// Number of fractional decimal digits in one ether.
pub const ETHER_DECIMALS: usize = 18;

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// An amount of native currency in wei.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Parse a decimal ether quantity (`"1"`, `"0.2"`, `".5"`) into wei.
    ///
    /// Signs, exponents, separators and more than 18 fractional digits are
    /// rejected. Zero is accepted here; callers that need a positive amount
    /// check [`Wei::is_zero`].
    pub fn from_ether_str(input: &str) -> Result<Self, TypesError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(TypesError::InvalidAmount("empty input".into()));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(TypesError::InvalidAmount(format!("{s:?} has no digits")));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(TypesError::InvalidAmount(format!("{s:?} is not a decimal number")));
        }
        if frac.len() > ETHER_DECIMALS {
            return Err(TypesError::InvalidAmount(format!(
                "{s:?} has more than {ETHER_DECIMALS} fractional digits"
            )));
        }

        let whole_wei = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .map_err(|_| TypesError::AmountOverflow)?
                .checked_mul(WEI_PER_ETHER)
                .ok_or(TypesError::AmountOverflow)?
        };
        let frac_wei = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<width$}", width = ETHER_DECIMALS);
            padded
                .parse::<u128>()
                .map_err(|e| TypesError::InvalidAmount(e.to_string()))?
        };

        whole_wei
            .checked_add(frac_wei)
            .map(Self)
            .ok_or(TypesError::AmountOverflow)
    }

    /// Format as a decimal ether string without trailing zeros (`"0.2"`).
    pub fn to_ether_string(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let frac = self.0 % WEI_PER_ETHER;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:0>width$}", width = ETHER_DECIMALS);
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }

    /// `0x`-prefixed minimal hex quantity, as used by Ethereum JSON-RPC.
    pub fn to_hex_quantity(&self) -> String {
        format!("{:#x}", self.0)
    }

    /// 32-byte big-endian ABI word.
    pub fn to_abi_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&self.0.to_be_bytes());
        word
    }
}

impl FromStr for Wei {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ether_str(s)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", self.to_ether_string())
    }
}

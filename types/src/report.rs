//! Report records as served by the backend.
//!
//! The backend speaks camelCase JSON:
//! `{"id": 1, "description": "...", "location": "...", "evidenceLink": "https://...",
//!   "verified": false, "reward": 0.5, "timestamp": "2024-05-01T12:00:00Z"}`.
//! `reward` is an ether decimal on the wire and wei in memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::{Wei, ETHER_DECIMALS};
use crate::error::TypesError;

/// Server-assigned report identifier; the same number is the contract's report id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ReportId(u64);

impl ReportId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// 32-byte big-endian ABI word (`uint256`).
    pub fn to_abi_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&self.0.to_be_bytes());
        word
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('#');
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| TypesError::InvalidReportId(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ReportId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(Self(n)),
            RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A help request submitted by an individual, with its verification status.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "deserialize_link")]
    pub evidence_link: Option<String>,
    #[serde(default)]
    pub verified: bool,
    /// Reward paid on verification. Zero while pending.
    #[serde(default, deserialize_with = "deserialize_ether")]
    pub reward: Wei,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Report {
    /// Minimal pending report, used when building fixtures.
    pub fn pending(id: u64) -> Self {
        Self {
            id: ReportId::new(id),
            description: String::new(),
            location: String::new(),
            evidence_link: None,
            verified: false,
            reward: Wei::ZERO,
            timestamp: None,
        }
    }

    /// Human status label.
    pub fn status_label(&self) -> &'static str {
        if self.verified {
            "Verified"
        } else {
            "Pending Review"
        }
    }
}

/// Empty strings are treated as "no evidence".
fn deserialize_link<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Accepts a JSON number or numeric string denominated in ether; `null` is zero.
fn deserialize_ether<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Wei, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawEther {
        Number(f64),
        Text(String),
    }

    match Option::<RawEther>::deserialize(deserializer)? {
        None => Ok(Wei::ZERO),
        // f64 Display never uses exponent notation; digits past wei precision are dropped.
        Some(RawEther::Number(n)) => {
            let text = n.to_string();
            Wei::from_ether_str(truncate_to_wei(&text)).map_err(serde::de::Error::custom)
        }
        Some(RawEther::Text(s)) => Wei::from_ether_str(&s).map_err(serde::de::Error::custom),
    }
}

fn truncate_to_wei(text: &str) -> &str {
    match text.find('.') {
        Some(dot) => &text[..text.len().min(dot + 1 + ETHER_DECIMALS)],
        None => text,
    }
}

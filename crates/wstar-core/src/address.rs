// crates/wstar-core/src/address.rs
//
// 20-byte account identifier shared by externally-owned actors and contracts.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::crypto::{contract_address_bytes, hash_bytes, truncate_to_address, ADDRESS_LEN};
use crate::error::WstarError;

/// An account address.
///
/// `Address::ZERO` stands for "nobody": unowned points, unset proxies, and the
/// source/sink of token mints and burns.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The null address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Deterministic address for a named actor (e.g. "creator", "mallory").
    pub fn from_label(label: &str) -> Self {
        Self(truncate_to_address(&hash_bytes(label.as_bytes())))
    }

    /// Address of the contract created by `deployer` with the given nonce.
    pub fn derive(deployer: &Address, nonce: u64) -> Self {
        Self(contract_address_bytes(&deployer.0, nonce))
    }

    /// Whether this is the null address.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Abbreviated form for log lines and tables: `0x1234…abcd`.
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}…{}", &full[..4], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = WstarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| WstarError::Parse(format!("Invalid address {:?}: {}", s, e)))?;
        let array: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            WstarError::Parse(format!(
                "Invalid address {:?}: expected {} bytes",
                s, ADDRESS_LEN
            ))
        })?;
        Ok(Self(array))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

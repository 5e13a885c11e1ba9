//! Account addresses.
//!
//! An address is an opaque 32-byte identity rendered in base58. The all-zero
//! address is reserved as the "nobody" sentinel.

use crate::error::{Result, TokenError};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 32;

/// A 32-byte account address.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The reserved all-zero address.
    pub const ZERO: Self = Self([0; ADDRESS_LEN]);

    /// Create an address from a base58-encoded string.
    ///
    /// # Errors
    ///
    /// Returns error if the string is not valid base58 or wrong length.
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TokenError::invalid_address(format!("invalid base58: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Create an address from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns error if bytes are not 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            TokenError::invalid_address(format!(
                "address must be {ADDRESS_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Generate a fresh random address from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derive a stable address from a human label.
    ///
    /// Used by the CLI and tests to name accounts (`alice`, `bob`).
    #[must_use]
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"shelf:address:");
        hasher.update(label.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Returns true for the reserved all-zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDRESS_LEN]
    }

    /// Get the raw bytes of the address.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Get the base58-encoded address string.
    #[must_use]
    pub fn as_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Short form for log lines and tables.
    #[must_use]
    pub fn short(&self) -> String {
        let full = self.as_base58();
        if full.len() <= 10 {
            return full;
        }
        format!("{}..{}", &full[..4], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.as_base58())
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.as_base58()
    }
}

impl TryFrom<String> for Address {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_base58(&value)
    }
}

impl std::str::FromStr for Address {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

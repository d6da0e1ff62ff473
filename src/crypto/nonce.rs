//! 256-bit salt nonce passed to `createProxyWithNonce`.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Big-endian uint256. Arithmetic wraps at 2^256.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SaltNonce(pub [u8; 32]);

impl SaltNonce {
    pub const ZERO: SaltNonce = SaltNonce([0u8; 32]);

    pub fn from_u64(n: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_u256(n: U256) -> Self {
        Self(n.to_be_bytes())
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_be_bytes(self.0)
    }

    pub fn from_decimal(s: &str) -> Result<Self, Error> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidNonce(format!("{s:?} is not a decimal integer")));
        }
        U256::from_str_radix(s, 10)
            .map(Self::from_u256)
            .map_err(|_| Error::InvalidNonce(format!("{s} exceeds 2^256 - 1")))
    }

    /// Parses `0x`-prefixed hex of at most 64 digits.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let h = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| Error::InvalidNonce(format!("{s:?} is missing 0x prefix")))?;
        if h.is_empty() || h.len() > 64 {
            return Err(Error::InvalidNonce(format!(
                "{s}: expected 1 to 64 hex digits"
            )));
        }
        U256::from_str_radix(h, 16)
            .map(Self::from_u256)
            .map_err(|e| Error::InvalidNonce(format!("{s}: {e}")))
    }

    /// Lowercase hex, 64 digits, no 0x.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decimal rendering, as used by Safe SDK `saltNonce` strings.
    pub fn to_decimal(&self) -> String {
        self.to_u256().to_string()
    }

    /// Increment by 1 (with wrapping).
    #[inline]
    pub fn increment(&mut self) {
        for byte in self.0.iter_mut().rev() {
            let (val, overflow) = byte.overflowing_add(1);
            *byte = val;
            if !overflow {
                return;
            }
        }
    }

    pub fn wrapping_add_u64(self, n: u64) -> Self {
        Self::from_u256(self.to_u256().wrapping_add(U256::from(n)))
    }
}

impl FromStr for SaltNonce {
    type Err = Error;

    /// `0x...` is hex, anything else decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_decimal(s)
        }
    }
}

impl fmt::Debug for SaltNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SaltNonce({})", self.to_decimal())
    }
}

impl fmt::Display for SaltNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

impl Serialize for SaltNonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for SaltNonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

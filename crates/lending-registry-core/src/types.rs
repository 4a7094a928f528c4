//! Strong type definitions for the lending registry.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Number of bytes an item key occupies at the boundary (`hexZeroPad(.., 6)`).
pub const KEY_WIDTH: usize = 6;

/// Largest value that fits in [`KEY_WIDTH`] bytes.
pub const MAX_ISBN: u64 = (1 << (KEY_WIDTH * 8)) - 1;

/// Wei per ether.
const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Decimal places in one ether.
const ETHER_DECIMALS: usize = 18;

/// The fixed fee every borrow must pay: 1 finney (0.001 ether).
pub const BORROW_FEE: Amount = Amount(1_000_000_000_000_000);

/// A 20-byte account identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex string, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidHex(format!("account must be 20 bytes: {}", s)))?;
        Ok(Self(arr))
    }

    /// The zero account.
    pub const ZERO: Self = Self([0u8; 20]);
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", &self.to_hex()[..10])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 20]> for AccountId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for AccountId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Identifier of an item in the catalog.
///
/// Either a sequentially assigned number or a caller-supplied ISBN,
/// depending on the key strategy. Zero is reserved as [`ItemKey::NONE`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ItemKey(pub u64);

impl ItemKey {
    /// Sentinel for "no item": unknown titles and accounts with no loan.
    pub const NONE: Self = Self(0);

    /// Create from a raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Whether this is the "none" sentinel.
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// `Some(self)` unless this is the sentinel.
    pub fn into_option(self) -> Option<Self> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }

    /// Render as zero-padded big-endian hex, at least [`KEY_WIDTH`] bytes wide.
    pub fn to_padded_hex(&self) -> String {
        let bytes = self.0.to_be_bytes();
        let skip = bytes
            .iter()
            .take(bytes.len() - KEY_WIDTH)
            .take_while(|b| **b == 0)
            .count();
        format!("0x{}", hex::encode(&bytes[skip..]))
    }

    /// Parse a big-endian hex key such as `0x08bb8d2a5f25`.
    pub fn from_padded_hex(s: &str) -> Result<Self, CoreError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        if bytes.len() > 8 {
            return Err(CoreError::InvalidHex(format!("key wider than 8 bytes: {}", s)));
        }
        let value = bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        Ok(Self(value))
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey({})", self.0)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A numeric ISBN supplied by the administrator.
///
/// Only values in `1..=MAX_ISBN` are accepted as catalog keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Isbn(pub u64);

impl Isbn {
    /// Whether the ISBN can be used as a key.
    pub const fn is_valid(&self) -> bool {
        self.0 != 0 && self.0 <= MAX_ISBN
    }

    /// The key this ISBN maps to.
    pub const fn key(&self) -> ItemKey {
        ItemKey(self.0)
    }
}

impl fmt::Debug for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Isbn({})", self.0)
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Isbn {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// An amount of native currency, in wei.
///
/// Serializes as a decimal wei string; not every serde format carries `u128`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub u128);

impl Amount {
    /// Zero value.
    pub const ZERO: Self = Self(0);

    /// Create from wei.
    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    /// Get the value in wei.
    pub const fn wei(&self) -> u128 {
        self.0
    }

    /// Whether the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Add, saturating at `u128::MAX`.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parse a decimal ether string such as `"0.001"` or `"1"`.
    pub fn parse_ether(s: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidAmount(s.to_string());
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > ETHER_DECIMALS
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: u128 = if frac.is_empty() {
            0
        } else {
            let scale = 10u128.pow((ETHER_DECIMALS - frac.len()) as u32);
            frac.parse::<u128>().map_err(|_| invalid())? * scale
        };

        whole
            .checked_mul(WEI_PER_ETHER)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }

    /// Format as a decimal ether string (`"0.001"`, `"1.0"`).
    pub fn format_ether(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let frac = self.0 % WEI_PER_ETHER;
        let frac = format!("{:0width$}", frac, width = ETHER_DECIMALS);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            format!("{}.0", whole)
        } else {
            format!("{}.{}", whole, frac)
        }
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({} wei)", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", self.format_ether())
    }
}

impl From<u128> for Amount {
    fn from(wei: u128) -> Self {
        Self(wei)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(de::Error::custom(format!("invalid wei amount: {:?}", s)));
        }
        s.parse().map(Self).map_err(de::Error::custom)
    }
}

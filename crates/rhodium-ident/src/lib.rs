//! Time-ordered 16-byte record identifiers and the per-host values they are built from.
//!
//! An identifier is laid out as
//! `[7 bytes epoch-ms BE][2 bytes node fingerprint][7 bytes counter BE]`, so identifiers
//! issued by one node sort by issue order when compared bytewise.

mod node;
mod seed;

pub use node::{NodeFingerprint, fingerprint, hardware_id};
pub use seed::TrngSeed;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Total identifier length in bytes.
pub const ID_LEN: usize = 16;
/// Length of the hex form used at every external boundary.
pub const ID_HEX_LEN: usize = ID_LEN * 2;

const TIMESTAMP_LEN: usize = 7;
const NODE_LEN: usize = 2;
const COUNTER_OFFSET: usize = TIMESTAMP_LEN + NODE_LEN;

/// Largest value representable in a 56-bit field.
pub const MAX_U56: u64 = (1 << 56) - 1;
/// Largest counter value an identifier can carry.
pub const MAX_COUNTER: u64 = MAX_U56;
/// Largest millisecond timestamp an identifier can carry (roughly year 4253).
pub const MAX_TIMESTAMP_MS: u64 = MAX_U56;

pub type IdResult<T> = Result<T, IdError>;

/// Globally unique, time-ordered record identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId([u8; ID_LEN]);

impl ItemId {
    /// Assemble an identifier from its three components.
    pub fn compose(timestamp_ms: u64, node: NodeFingerprint, counter: u64) -> IdResult<Self> {
        if timestamp_ms > MAX_TIMESTAMP_MS {
            return Err(IdError::TimestampOutOfRange(timestamp_ms));
        }
        if counter > MAX_COUNTER {
            return Err(IdError::CounterOutOfRange(counter));
        }
        let mut buf = [0u8; ID_LEN];
        write_u56(&mut buf[..TIMESTAMP_LEN], timestamp_ms);
        buf[TIMESTAMP_LEN..COUNTER_OFFSET].copy_from_slice(node.as_bytes());
        write_u56(&mut buf[COUNTER_OFFSET..], counter);
        Ok(ItemId(buf))
    }

    /// Milliseconds since the Unix epoch at issue time.
    pub fn timestamp_ms(&self) -> u64 {
        read_u56(&self.0[..TIMESTAMP_LEN])
    }

    /// Fingerprint of the node that issued the identifier.
    pub fn node(&self) -> NodeFingerprint {
        NodeFingerprint::from_bytes([self.0[TIMESTAMP_LEN], self.0[TIMESTAMP_LEN + 1]])
    }

    /// Counter value consumed when the identifier was issued.
    pub fn counter(&self) -> u64 {
        read_u56(&self.0[COUNTER_OFFSET..])
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Render the identifier as 32 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the 32-character hex form. Anything else is rejected.
    pub fn from_hex_str(s: &str) -> IdResult<Self> {
        if s.len() != ID_HEX_LEN {
            return Err(IdError::InvalidIdentifier(format!(
                "expected {ID_HEX_LEN} hex characters, got {}",
                s.len()
            )));
        }
        let mut buf = [0u8; ID_LEN];
        hex::decode_to_slice(s, &mut buf)
            .map_err(|err| IdError::InvalidIdentifier(err.to_string()))?;
        Ok(ItemId(buf))
    }

    /// Build an identifier from raw bytes, ensuring the length matches.
    pub fn from_bytes(bytes: &[u8]) -> IdResult<Self> {
        let arr: [u8; ID_LEN] = bytes.try_into().map_err(|_| {
            IdError::InvalidIdentifier(format!("expected {ID_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(ItemId(arr))
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ItemId").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; ID_LEN]> for ItemId {
    fn from(value: [u8; ID_LEN]) -> Self {
        ItemId(value)
    }
}

impl From<ItemId> for [u8; ID_LEN] {
    fn from(value: ItemId) -> Self {
        value.0
    }
}

impl TryFrom<&[u8]> for ItemId {
    type Error = IdError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        ItemId::from_bytes(value)
    }
}

impl TryFrom<&str> for ItemId {
    type Error = IdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ItemId::from_hex_str(value)
    }
}

impl FromStr for ItemId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemId::from_hex_str(s)
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ItemId::from_hex_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("invalid node fingerprint '{0}': expected 4 hex characters")]
    InvalidFingerprint(String),
    #[error("invalid seed '{0}': expected 14 hex characters")]
    InvalidSeed(String),
    #[error("counter value {0} does not fit in 56 bits")]
    CounterOutOfRange(u64),
    #[error("timestamp {0}ms does not fit in 56 bits")]
    TimestampOutOfRange(u64),
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
}

pub(crate) fn write_u56(dst: &mut [u8], value: u64) {
    dst.copy_from_slice(&value.to_be_bytes()[1..]);
}

pub(crate) fn read_u56(src: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[1..].copy_from_slice(src);
    u64::from_be_bytes(buf)
}

use crate::{IdError, IdResult};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::warn;

/// Bit set on randomly generated hardware ids so they can never equal a real unicast MAC.
const MULTICAST_BIT: u64 = 1 << 40;
const HARDWARE_ID_MASK: u64 = (1 << 48) - 1;

/// 16-bit host fingerprint embedded in every identifier a node issues.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeFingerprint([u8; 2]);

impl NodeFingerprint {
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        NodeFingerprint(bytes)
    }

    /// Derive the fingerprint from a 48-bit hardware identifier.
    ///
    /// The id is serialized as 6 big-endian bytes and hashed with SHA-256; the first two
    /// digest bytes become the fingerprint, so the raw MAC never appears in identifiers.
    pub fn from_hardware_id(hardware_id: u64) -> Self {
        let bytes = (hardware_id & HARDWARE_ID_MASK).to_be_bytes();
        let digest = Sha256::digest(&bytes[2..]);
        NodeFingerprint([digest[0], digest[1]])
    }

    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }

    /// Four lowercase hex characters, the form persisted as the `node_id` parameter.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex_str(s: &str) -> IdResult<Self> {
        let mut buf = [0u8; 2];
        if s.len() != 4 || hex::decode_to_slice(s, &mut buf).is_err() {
            return Err(IdError::InvalidFingerprint(s.to_string()));
        }
        Ok(NodeFingerprint(buf))
    }
}

impl fmt::Debug for NodeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeFingerprint").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for NodeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Read this host's 48-bit hardware identifier.
///
/// Uses the primary MAC address. When none can be read, a random 48-bit value with the
/// multicast bit set is returned instead.
pub fn hardware_id() -> IdResult<u64> {
    match mac_address::get_mac_address() {
        Ok(Some(mac)) => {
            let mut buf = [0u8; 8];
            buf[2..].copy_from_slice(&mac.bytes());
            Ok(u64::from_be_bytes(buf))
        }
        Ok(None) => {
            warn!("no MAC address found; using a random hardware id");
            random_hardware_id()
        }
        Err(err) => {
            warn!("reading MAC address failed ({err}); using a random hardware id");
            random_hardware_id()
        }
    }
}

/// Fingerprint of the current host. Only the bootstrap path should call this.
pub fn fingerprint() -> IdResult<NodeFingerprint> {
    Ok(NodeFingerprint::from_hardware_id(hardware_id()?))
}

fn random_hardware_id() -> IdResult<u64> {
    let mut buf = [0u8; 8];
    getrandom::getrandom(&mut buf[2..]).map_err(|err| IdError::Entropy(err.to_string()))?;
    Ok(u64::from_be_bytes(buf) | MULTICAST_BIT)
}

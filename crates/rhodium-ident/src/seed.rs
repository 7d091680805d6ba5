use crate::{IdError, IdResult, MAX_U56, read_u56};
use std::fmt;

const SEED_LEN: usize = 7;

/// Non-zero 56-bit random value drawn once per installation.
///
/// Recorded as the `trng_seed` parameter and used as the starting point of the primary
/// counter, so two installations that share a fingerprint are unlikely to share counters.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TrngSeed(u64);

impl TrngSeed {
    /// Draw a fresh seed from the operating system's CSPRNG.
    pub fn generate() -> IdResult<Self> {
        loop {
            let mut buf = [0u8; SEED_LEN];
            getrandom::getrandom(&mut buf).map_err(|err| IdError::Entropy(err.to_string()))?;
            let value = read_u56(&buf);
            if value != 0 {
                return Ok(TrngSeed(value));
            }
        }
    }

    /// Wrap a known value; zero and values wider than 56 bits are rejected.
    pub fn from_value(value: u64) -> IdResult<Self> {
        if value == 0 || value > MAX_U56 {
            return Err(IdError::InvalidSeed(format!("{value:x}")));
        }
        Ok(TrngSeed(value))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Fourteen lowercase hex characters, zero padded.
    pub fn to_hex(&self) -> String {
        format!("{:014x}", self.0)
    }

    pub fn from_hex_str(s: &str) -> IdResult<Self> {
        if s.len() != SEED_LEN * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(IdError::InvalidSeed(s.to_string()));
        }
        let value = u64::from_str_radix(s, 16).map_err(|_| IdError::InvalidSeed(s.to_string()))?;
        TrngSeed::from_value(value).map_err(|_| IdError::InvalidSeed(s.to_string()))
    }
}

impl fmt::Debug for TrngSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TrngSeed").field(&self.to_hex()).finish()
    }
}

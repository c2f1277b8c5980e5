//! Fixed-width content digest for integrity checks.

use crate::config::HASH_SIZE;
use sha2::{Digest as _, Sha256};

/// Digest stored with every item.
pub type Digest = [u8; HASH_SIZE];

/// Outcome of comparing extracted bytes against their stored digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Digest matches.
    Verified,
    /// Digest differs. The extracted file is kept.
    Mismatch { expected: Digest, actual: Digest },
}

impl Verification {
    /// Whether the digest matched.
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified)
    }
}

/// Compute the 16-byte digest of `data` (truncated SHA-256).
pub fn digest16(data: &[u8]) -> Digest {
    let full = Sha256::digest(data);
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&full[..HASH_SIZE]);
    out
}

/// Compare a fresh digest of `data` with `expected`.
pub fn verify(data: &[u8], expected: &Digest) -> Verification {
    let actual = digest16(data);
    if actual == *expected {
        Verification::Verified
    } else {
        Verification::Mismatch {
            expected: *expected,
            actual,
        }
    }
}

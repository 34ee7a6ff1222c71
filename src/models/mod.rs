//! Domain model module declarations.

use sha2::{Digest, Sha256};

pub mod checkpoint;
pub mod event;
pub mod session;
pub mod snapshot;

/// Compute SHA-256 hex digest of the given bytes.
pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

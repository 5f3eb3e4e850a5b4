//! Keccak-256 hashing

use sha3::{Digest, Keccak256};
use volt_primitives::H256;

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    H256::from_bytes(Keccak256::digest(data).into())
}

/// Hash the concatenation of several byte strings without building it first
pub fn keccak256_concat(parts: &[&[u8]]) -> H256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    H256::from_bytes(hasher.finalize().into())
}

//! # volt-crypto
//!
//! Cryptographic primitives for Volt.
//!
//! - Keccak-256 hashing
//! - secp256k1 signing with low-s normalization
//! - Signer recovery and address derivation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod signature;

pub use error::CryptoError;
pub use hash::{keccak256, keccak256_concat};
pub use signature::{
    public_key_to_address, recover_address, recover_public_key, sign, verify, PrivateKey,
    PublicKey, Signature,
};

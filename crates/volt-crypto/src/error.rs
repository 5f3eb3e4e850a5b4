//! Signature errors

use thiserror::Error;

/// Failures signing or recovering a secp256k1 signature
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The key could not produce a signature
    #[error("cannot sign: {0}")]
    SigningFailed(String),

    /// Signature bytes have the wrong length
    #[error("invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    /// r or s is not a valid scalar
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// `v` is neither 0 nor 1
    #[error("recovery id out of range: {0}")]
    InvalidRecoveryId(u8),

    /// No public key matches the signature
    #[error("cannot recover public key: {0}")]
    RecoveryFailed(String),
}

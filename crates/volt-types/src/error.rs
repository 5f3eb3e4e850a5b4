//! Transaction errors

use thiserror::Error;
use volt_crypto::CryptoError;

/// Transaction-level error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// Signature missing, malformed or not recoverable
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] CryptoError),

    /// Intrinsic gas does not fit in 64 bits
    #[error("intrinsic gas overflow")]
    IntrinsicGasOverflow,

    /// Builder was missing a required field
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// RLP decoding failed
    #[error("rlp decoding failed: {0}")]
    Rlp(#[from] rlp::DecoderError),
}

/// Result type for transaction operations
pub type Result<T> = std::result::Result<T, TxError>;

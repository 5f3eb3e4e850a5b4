//! Transaction processing errors

use thiserror::Error;
use volt_crypto::CryptoError;
use volt_primitives::{Address, U256};
use volt_storage::StorageError;

/// Reasons a transaction is rejected without a receipt
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Origin could not be recovered from the signature
    #[error("invalid signature: {0}")]
    InvalidSignature(#[source] CryptoError),

    /// Transaction fields cannot be evaluated
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// Gas limit below the intrinsic gas
    #[error("intrinsic gas exceeds provided gas: intrinsic {intrinsic}, provided {provided}")]
    InsufficientGas {
        /// Intrinsic gas of the clauses
        intrinsic: u64,
        /// Gas limit of the transaction
        provided: u64,
    },

    /// Prepayment could not be debited
    #[error("insufficient energy: {payer} cannot pay {required}")]
    InsufficientEnergy {
        /// Account that was asked to pay
        payer: Address,
        /// Prepaid amount, gas limit times gas price
        required: U256,
    },

    /// World state could not be read or written
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RuntimeError {
    /// Short label used when counting rejections
    pub fn reason(&self) -> &'static str {
        match self {
            RuntimeError::InvalidSignature(_) => "invalid_signature",
            RuntimeError::MalformedTransaction(_) => "malformed_transaction",
            RuntimeError::InsufficientGas { .. } => "insufficient_gas",
            RuntimeError::InsufficientEnergy { .. } => "insufficient_energy",
            RuntimeError::Storage(_) => "storage",
        }
    }
}

/// Result type for transaction processing
pub type RuntimeResult<T> = Result<T, RuntimeError>;

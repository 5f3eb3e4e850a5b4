//! VM error types

use thiserror::Error;
use volt_storage::StorageError;

/// Reasons a call frame stops abnormally
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Out of gas
    #[error("out of gas")]
    OutOfGas,

    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,

    /// Stack overflow
    #[error("stack overflow (max 1024)")]
    StackOverflow,

    /// Invalid jump destination
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// Invalid opcode
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Write in static context
    #[error("state modification in static context")]
    StaticCallViolation,

    /// Return data out of bounds
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,

    /// Contract creation collision
    #[error("contract address collision")]
    CreateCollision,

    /// Deployed code over the size limit
    #[error("max code size exceeded (limit: {0} bytes)")]
    MaxCodeSizeExceeded(usize),

    /// Call depth exceeded
    #[error("call depth exceeded (max {0})")]
    CallDepthExceeded(usize),

    /// Insufficient balance for transfer
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Malformed input to a native contract
    #[error("invalid call input")]
    InvalidInput,

    /// Revert with data
    #[error("execution reverted")]
    Revert(Vec<u8>),

    /// World state could not be read or written
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl VmError {
    /// Whether the error comes from the state backend rather than the executed code.
    ///
    /// Fatal errors abort every enclosing frame and must not be recorded as a revert.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VmError::Storage(_))
    }

    /// Whether the frame keeps its unused gas
    pub fn keeps_gas(&self) -> bool {
        matches!(
            self,
            VmError::Revert(_) | VmError::InsufficientBalance | VmError::CallDepthExceeded(_)
        )
    }
}

/// Result type for VM operations
pub type VmResult<T> = Result<T, VmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", VmError::OutOfGas), "out of gas");
        assert_eq!(format!("{}", VmError::StackOverflow), "stack overflow (max 1024)");
        assert_eq!(format!("{}", VmError::InvalidJump(100)), "invalid jump destination: 100");
        assert_eq!(format!("{}", VmError::InvalidOpcode(0xFE)), "invalid opcode: 0xfe");
        assert_eq!(
            format!("{}", VmError::StaticCallViolation),
            "state modification in static context"
        );
        assert_eq!(
            format!("{}", VmError::MaxCodeSizeExceeded(24576)),
            "max code size exceeded (limit: 24576 bytes)"
        );
        assert_eq!(format!("{}", VmError::CallDepthExceeded(1024)), "call depth exceeded (max 1024)");
        assert_eq!(format!("{}", VmError::Revert(vec![1, 2, 3])), "execution reverted");
    }

    #[test]
    fn test_fatal_only_for_storage() {
        assert!(VmError::Storage(StorageError::NotOpen).is_fatal());
        assert!(!VmError::OutOfGas.is_fatal());
        assert!(!VmError::Revert(vec![]).is_fatal());
    }

    #[test]
    fn test_keeps_gas() {
        assert!(VmError::Revert(vec![]).keeps_gas());
        assert!(VmError::InsufficientBalance.keeps_gas());
        assert!(!VmError::OutOfGas.keeps_gas());
        assert!(!VmError::InvalidOpcode(0xfe).keeps_gas());
    }

    #[test]
    fn test_storage_conversion() {
        let err: VmError = StorageError::MissingCode(volt_primitives::H256::ZERO).into();
        assert!(matches!(err, VmError::Storage(StorageError::MissingCode(_))));
    }
}

//! World-state storage errors

use thiserror::Error;

/// Failures reading or writing persisted state
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Underlying RocksDB failure
    #[error("rocksdb: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Stored bytes do not decode
    #[error("corrupt record: {0}")]
    Deserialization(String),

    /// Credit would push a balance past 2^256 - 1
    #[error("balance overflow at {0}")]
    BalanceOverflow(volt_primitives::Address),

    /// Account refers to code that is not stored
    #[error("missing code for hash {0}")]
    MissingCode(volt_primitives::H256),

    /// Column family was not created when the database was opened
    #[error("unknown column family: {0}")]
    InvalidColumnFamily(String),

    /// Access before `open`
    #[error("database is not open")]
    NotOpen,

    /// Second `open` on the same handle
    #[error("database is already open")]
    AlreadyOpen,
}

/// Result alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

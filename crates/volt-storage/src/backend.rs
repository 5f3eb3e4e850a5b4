//! Persistence boundary for world state

use std::collections::BTreeMap;

use bytes::Bytes;
use volt_primitives::{Address, H256};

use crate::account::Account;
use crate::error::StorageResult;

/// Read access to committed state plus an atomic commit.
///
/// A missing storage slot reads as `H256::ZERO`, and writing zero deletes it.
pub trait Backend: Send + Sync {
    /// Get account by address
    fn account(&self, address: &Address) -> StorageResult<Option<Account>>;

    /// Get contract code by hash
    fn code(&self, code_hash: &H256) -> StorageResult<Option<Bytes>>;

    /// Get storage value
    fn storage(&self, address: &Address, key: &H256) -> StorageResult<H256>;

    /// Apply a change set atomically
    fn commit(&self, changes: ChangeSet) -> StorageResult<()>;
}

/// Flattened writes, ordered so that commits are deterministic
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Updated accounts
    pub accounts: BTreeMap<Address, Account>,
    /// Updated storage slots
    pub storage: BTreeMap<(Address, H256), H256>,
    /// New code by hash
    pub code: BTreeMap<H256, Bytes>,
}

impl ChangeSet {
    /// Create an empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing changed
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.storage.is_empty() && self.code.is_empty()
    }

    /// Overlay `other` on top of `self`
    pub fn extend(&mut self, other: ChangeSet) {
        self.accounts.extend(other.accounts);
        self.storage.extend(other.storage);
        self.code.extend(other.code);
    }
}

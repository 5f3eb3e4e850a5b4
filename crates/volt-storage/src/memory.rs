//! In-memory backend

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;
use volt_primitives::{Address, H256};

use crate::account::Account;
use crate::backend::{Backend, ChangeSet};
use crate::error::StorageResult;

/// Backend holding committed state in hash maps
#[derive(Default)]
pub struct MemoryBackend {
    accounts: RwLock<HashMap<Address, Account>>,
    storage: RwLock<HashMap<(Address, H256), H256>>,
    code: RwLock<HashMap<H256, Bytes>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }
}

impl Backend for MemoryBackend {
    fn account(&self, address: &Address) -> StorageResult<Option<Account>> {
        Ok(self.accounts.read().get(address).cloned())
    }

    fn code(&self, code_hash: &H256) -> StorageResult<Option<Bytes>> {
        Ok(self.code.read().get(code_hash).cloned())
    }

    fn storage(&self, address: &Address, key: &H256) -> StorageResult<H256> {
        Ok(self
            .storage
            .read()
            .get(&(*address, *key))
            .copied()
            .unwrap_or(H256::ZERO))
    }

    fn commit(&self, changes: ChangeSet) -> StorageResult<()> {
        let mut accounts = self.accounts.write();
        let mut storage = self.storage.write();
        let mut code = self.code.write();

        accounts.extend(changes.accounts);
        for (slot, value) in changes.storage {
            if value.is_zero() {
                storage.remove(&slot);
            } else {
                storage.insert(slot, value);
            }
        }
        code.extend(changes.code);
        Ok(())
    }
}

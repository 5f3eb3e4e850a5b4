//! RocksDB-backed state

use bytes::Bytes;
use tracing::debug;
use volt_primitives::{Address, H256};

use crate::account::Account;
use crate::backend::{Backend, ChangeSet};
use crate::db::{cf, Batch, Database};
use crate::error::{StorageError, StorageResult};

/// Storage key combining address and slot
fn storage_key(address: &Address, slot: &H256) -> Vec<u8> {
    let mut key = Vec::with_capacity(20 + 32);
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(slot.as_bytes());
    key
}

/// State database backed by RocksDB
#[derive(Clone)]
pub struct StateDb {
    db: Database,
}

impl StateDb {
    /// Wrap an opened database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get the underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Backend for StateDb {
    fn account(&self, address: &Address) -> StorageResult<Option<Account>> {
        self.db
            .get(cf::ACCOUNTS, address.as_bytes())?
            .map(|bytes| Account::from_bytes(&bytes))
            .transpose()
    }

    fn code(&self, code_hash: &H256) -> StorageResult<Option<Bytes>> {
        Ok(self.db.get(cf::CODE, code_hash.as_bytes())?.map(Bytes::from))
    }

    fn storage(&self, address: &Address, key: &H256) -> StorageResult<H256> {
        match self.db.get(cf::STORAGE, &storage_key(address, key))? {
            Some(bytes) => {
                H256::from_slice(&bytes).map_err(|e| StorageError::Deserialization(e.to_string()))
            }
            None => Ok(H256::ZERO),
        }
    }

    fn commit(&self, changes: ChangeSet) -> StorageResult<()> {
        let mut batch = Batch::new();

        for (address, account) in &changes.accounts {
            batch.put(cf::ACCOUNTS, address.as_bytes().to_vec(), account.to_bytes());
        }
        for ((address, slot), value) in &changes.storage {
            let key = storage_key(address, slot);
            if value.is_zero() {
                batch.delete(cf::STORAGE, key);
            } else {
                batch.put(cf::STORAGE, key, value.as_bytes().to_vec());
            }
        }
        for (code_hash, code) in &changes.code {
            batch.put(cf::CODE, code_hash.as_bytes().to_vec(), code.to_vec());
        }

        debug!(
            accounts = changes.accounts.len(),
            slots = changes.storage.len(),
            code = changes.code.len(),
            "committing state changes"
        );
        self.db.write_batch(batch)
    }
}

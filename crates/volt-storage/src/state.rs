//! Layered world state
//!
//! Writes go into a stack of layers above a shared [`Backend`]. A checkpoint is
//! the stack depth at the time it was taken, so reverting is a truncation and
//! never replays an undo log.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;
use volt_crypto::keccak256;
use volt_primitives::{Address, H256, U256};

use crate::account::{Account, EMPTY_CODE_HASH};
use crate::backend::{Backend, ChangeSet};
use crate::error::{StorageError, StorageResult};

/// Handle to a point in the write history of a [`State`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl Checkpoint {
    /// Layer depth this checkpoint restores to
    pub fn depth(&self) -> usize {
        self.0
    }
}

#[derive(Default)]
struct Layer {
    accounts: HashMap<Address, Account>,
    storage: HashMap<(Address, H256), H256>,
    code: HashMap<H256, Bytes>,
}

impl Layer {
    fn absorb(&mut self, other: Layer) {
        self.accounts.extend(other.accounts);
        self.storage.extend(other.storage);
        self.code.extend(other.code);
    }
}

/// Mutable view of world state with nested checkpoints
pub struct State {
    backend: Arc<dyn Backend>,
    layers: Vec<Layer>,
}

impl State {
    /// Create a state over a backend
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            layers: vec![Layer::default()],
        }
    }

    /// The backend reads fall through to
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Current number of write layers
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Start a new write layer
    pub fn new_checkpoint(&mut self) -> Checkpoint {
        let checkpoint = Checkpoint(self.layers.len());
        self.layers.push(Layer::default());
        checkpoint
    }

    /// Discard every write made since `checkpoint`
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        let depth = checkpoint.0.max(1);
        trace!(from = self.layers.len(), to = depth, "reverting state");
        self.layers.truncate(depth);
    }

    /// Keep the writes made since `checkpoint` and drop the checkpoint itself
    pub fn discard_checkpoint(&mut self, checkpoint: Checkpoint) {
        let depth = checkpoint.0.max(1);
        while self.layers.len() > depth {
            if let Some(top) = self.layers.pop() {
                if let Some(below) = self.layers.last_mut() {
                    below.absorb(top);
                }
            }
        }
    }

    fn lookup_account(&self, address: &Address) -> StorageResult<Option<Account>> {
        for layer in self.layers.iter().rev() {
            if let Some(account) = layer.accounts.get(address) {
                return Ok(Some(account.clone()));
            }
        }
        self.backend.account(address)
    }

    fn put_account(&mut self, address: Address, account: Account) {
        if let Some(top) = self.layers.last_mut() {
            top.accounts.insert(address, account);
        }
    }

    /// Get account (default if missing)
    pub fn account(&self, address: &Address) -> StorageResult<Account> {
        Ok(self.lookup_account(address)?.unwrap_or_default())
    }

    /// Check if an account exists and is not empty
    pub fn exists(&self, address: &Address) -> StorageResult<bool> {
        Ok(self
            .lookup_account(address)?
            .map(|account| !account.is_empty())
            .unwrap_or(false))
    }

    /// Get balance
    pub fn balance(&self, address: &Address) -> StorageResult<U256> {
        Ok(self.account(address)?.balance)
    }

    /// Set balance, settling energy to `time` first
    pub fn set_balance(&mut self, address: Address, balance: U256, time: u64) -> StorageResult<()> {
        let mut account = self.account(&address)?;
        account.settle(time);
        account.balance = balance;
        self.put_account(address, account);
        Ok(())
    }

    /// Move `value` from one balance to another. Returns false if `from` cannot afford it.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        time: u64,
    ) -> StorageResult<bool> {
        let from_balance = self.balance(&from)?;
        if from_balance < value {
            return Ok(false);
        }
        if value.is_zero() || from == to {
            return Ok(true);
        }
        let credited = self
            .balance(&to)?
            .checked_add(value)
            .ok_or(StorageError::BalanceOverflow(to))?;
        self.set_balance(from, from_balance - value, time)?;
        self.set_balance(to, credited, time)?;
        Ok(true)
    }

    /// Energy at `time`
    pub fn energy(&self, address: &Address, time: u64) -> StorageResult<U256> {
        Ok(self.account(address)?.energy_at(time))
    }

    /// Set energy as of `time`
    pub fn set_energy(&mut self, address: Address, energy: U256, time: u64) -> StorageResult<()> {
        let mut account = self.account(&address)?;
        account.settle(time);
        account.energy = energy;
        self.put_account(address, account);
        Ok(())
    }

    /// Code hash (zero for accounts that do not exist)
    pub fn code_hash(&self, address: &Address) -> StorageResult<H256> {
        Ok(self
            .lookup_account(address)?
            .filter(|account| !account.is_empty())
            .map(|account| account.code_hash)
            .unwrap_or(H256::ZERO))
    }

    /// Contract code (empty if none)
    pub fn code(&self, address: &Address) -> StorageResult<Bytes> {
        let code_hash = self.account(address)?.code_hash;
        if code_hash == EMPTY_CODE_HASH {
            return Ok(Bytes::new());
        }
        for layer in self.layers.iter().rev() {
            if let Some(code) = layer.code.get(&code_hash) {
                return Ok(code.clone());
            }
        }
        self.backend
            .code(&code_hash)?
            .ok_or(StorageError::MissingCode(code_hash))
    }

    /// Install contract code
    pub fn set_code(&mut self, address: Address, code: Bytes) -> StorageResult<()> {
        let mut account = self.account(&address)?;
        if code.is_empty() {
            account.code_hash = EMPTY_CODE_HASH;
        } else {
            let code_hash = keccak256(&code);
            account.code_hash = code_hash;
            if let Some(top) = self.layers.last_mut() {
                top.code.insert(code_hash, code);
            }
        }
        self.put_account(address, account);
        Ok(())
    }

    /// Get storage value
    pub fn storage(&self, address: &Address, key: &H256) -> StorageResult<H256> {
        let slot = (*address, *key);
        for layer in self.layers.iter().rev() {
            if let Some(value) = layer.storage.get(&slot) {
                return Ok(*value);
            }
        }
        self.backend.storage(address, key)
    }

    /// Set storage value
    pub fn set_storage(&mut self, address: Address, key: H256, value: H256) {
        if let Some(top) = self.layers.last_mut() {
            top.storage.insert((address, key), value);
        }
    }

    /// Every pending write, flattened bottom-up
    pub fn changes(&self) -> ChangeSet {
        let mut changes = ChangeSet::new();
        for layer in &self.layers {
            changes.accounts.extend(layer.accounts.iter().map(|(k, v)| (*k, v.clone())));
            changes.storage.extend(layer.storage.iter().map(|(k, v)| (*k, *v)));
            changes.code.extend(layer.code.iter().map(|(k, v)| (*k, v.clone())));
        }
        changes
    }

    /// Write pending changes to the backend and reset to a single empty layer
    pub fn commit(&mut self) -> StorageResult<()> {
        let changes = self.changes();
        self.backend.commit(changes)?;
        self.layers = vec![Layer::default()];
        Ok(())
    }
}

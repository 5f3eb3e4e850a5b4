//! Shared harness for runtime integration tests

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use k256::ecdsa::SigningKey;
use volt_builtins::energy;
use volt_crypto::public_key_to_address;
use volt_primitives::{Address, H256, U256};
use volt_runtime::{BlockEnvironment, Runtime};
use volt_storage::{Backend, MemoryBackend, State};
use volt_types::{Clause, Transaction, TransactionBuilder};

/// Block time used by every scenario; energy does not grow within it
pub const BLOCK_TIME: u64 = 1_000;

/// Default gas limit for test transactions
pub const DEFAULT_GAS: u64 = 1_000_000;

/// Default gas price
pub const GAS_PRICE: u64 = 1_000;

/// Energy given to funded accounts
pub const FUNDED_ENERGY: u64 = 10_000_000_000;

/// Balance given to funded accounts
pub const FUNDED_BALANCE: u64 = 1_000_000;

/// Test account with private key and address
#[derive(Clone)]
pub struct TestAccount {
    key: SigningKey,
    address: Address,
}

impl TestAccount {
    /// Create a new random test account
    pub fn random() -> Self {
        let key = SigningKey::random(&mut rand::thread_rng());
        let address = public_key_to_address(key.verifying_key());
        Self { key, address }
    }

    /// Get the account address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a transaction over `clauses`
    pub fn sign(&self, clauses: Vec<Clause>, gas: u64, gas_price: u64) -> Transaction {
        TransactionBuilder::new()
            .chain_tag(0x27)
            .block_ref(0)
            .expiration(720)
            .clauses(clauses)
            .gas_price(U256::from(gas_price))
            .gas(gas)
            .nonce(rand::random())
            .sign(&self.key)
            .unwrap()
    }
}

/// World state seeded for one scenario
pub struct TestWorld {
    backend: Arc<dyn Backend>,
    state: State,
}

impl TestWorld {
    /// Empty in-memory world
    pub fn new() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    /// Empty world over `backend`
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        let state = State::new(Arc::clone(&backend));
        Self { backend, state }
    }

    /// Give `address` balance and energy
    pub fn fund(mut self, address: Address, balance: u64, energy: u64) -> Self {
        self.state.set_balance(address, U256::from(balance), BLOCK_TIME).unwrap();
        energy::set_balance(&mut self.state, BLOCK_TIME, address, U256::from(energy)).unwrap();
        self
    }

    /// Deploy `code` at `address`
    pub fn deploy(mut self, address: Address, code: &[u8]) -> Self {
        self.state.set_code(address, Bytes::copy_from_slice(code)).unwrap();
        self
    }

    /// Preset a storage slot
    pub fn store(mut self, address: Address, key: H256, value: H256) -> Self {
        self.state.set_storage(address, key, value);
        self
    }

    /// Commit the seed and build a runtime over it
    pub fn runtime(mut self) -> Runtime {
        self.state.commit().unwrap();
        Runtime::new(State::new(self.backend), env())
    }
}

/// Environment of the block every scenario runs in
pub fn env() -> BlockEnvironment {
    BlockEnvironment {
        beneficiary: Address::from_bytes([0xbe; 20]),
        number: 10,
        time: BLOCK_TIME,
        gas_limit: 10_000_000,
        get_block_id: Arc::new(|n| H256::from_bytes([n as u8; 32])),
    }
}

/// Energy of `address` in the scenario block
pub fn energy_of(runtime: &Runtime, address: &Address) -> U256 {
    energy::get_balance(runtime.state(), BLOCK_TIME, address).unwrap()
}

/// Balance of `address`
pub fn balance_of(runtime: &Runtime, address: &Address) -> U256 {
    runtime.state().balance(address).unwrap()
}

/// Fixed address from a single byte
pub fn addr(n: u8) -> Address {
    Address::from_bytes([n; 20])
}

/// `PUSH1 0 PUSH1 0 REVERT`
pub const REVERT_CODE: &[u8] = &[0x60, 0x00, 0x60, 0x00, 0xfd];

/// Gas `REVERT_CODE` spends
pub const REVERT_CODE_GAS: u64 = 6;

/// `PUSH1 0 PUSH1 0 SSTORE STOP`, clearing slot zero
pub const CLEAR_SLOT_CODE: &[u8] = &[0x60, 0x00, 0x60, 0x00, 0x55, 0x00];

/// Gas `CLEAR_SLOT_CODE` spends on a non-zero slot, before refund
pub const CLEAR_SLOT_GAS: u64 = 5_006;

/// Sets slots 1 and 2 to one, then clears slot zero
pub const SET_TWO_CLEAR_ONE_CODE: &[u8] = &[
    0x60, 0x01, 0x60, 0x01, 0x55, // slot1 = 1
    0x60, 0x01, 0x60, 0x02, 0x55, // slot2 = 1
    0x60, 0x00, 0x60, 0x00, 0x55, // slot0 = 0
    0x00,
];

/// Gas `SET_TWO_CLEAR_ONE_CODE` spends on fresh slots 1 and 2 and a non-zero slot zero
pub const SET_TWO_CLEAR_ONE_GAS: u64 = 18 + 2 * 20_000 + 5_000;

/// Bumps slot zero, then calls itself with all remaining gas
pub const COUNTING_RECURSION_CODE: &[u8] = &[
    0x60, 0x00, 0x54, 0x60, 0x01, 0x01, 0x60, 0x00, 0x55, // slot0 += 1
    0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x30, 0x5a, 0xf1, 0x00,
];

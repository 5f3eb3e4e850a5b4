//! Genesis state loading

use std::collections::BTreeMap;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use volt_builtins::{energy, params};
use volt_primitives::{parse_u256, Address, H256, U256};
use volt_storage::{State, StorageError};

/// Genesis error types
#[derive(Debug, Error)]
pub enum GenesisError {
    /// File could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// File is not valid genesis JSON
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Storage error
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// Invalid genesis configuration
    #[error("invalid genesis config: {0}")]
    InvalidConfig(String),
}

/// Result type for genesis operations
pub type GenesisResult<T> = Result<T, GenesisError>;

/// Genesis configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Genesis timestamp, the time balances start generating energy from
    #[serde(default)]
    pub timestamp: u64,
    /// Address allowed to change governance parameters
    #[serde(default)]
    pub executor: Option<Address>,
    /// Initial account allocations keyed by address
    #[serde(default)]
    pub alloc: BTreeMap<String, GenesisAccount>,
    /// Initial governance parameters keyed by name
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// Genesis account allocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// Balance, decimal or 0x-hex
    #[serde(default)]
    pub balance: String,
    /// Energy, decimal or 0x-hex
    #[serde(default)]
    pub energy: String,
    /// Contract code (hex string)
    #[serde(default)]
    pub code: Option<String>,
    /// Storage (slot -> value mapping), both 32-byte hex words
    #[serde(default)]
    pub storage: BTreeMap<String, String>,
}

impl GenesisAccount {
    /// Parsed balance
    pub fn parse_balance(&self) -> GenesisResult<U256> {
        parse_quantity(&self.balance)
    }

    /// Parsed energy
    pub fn parse_energy(&self) -> GenesisResult<U256> {
        parse_quantity(&self.energy)
    }

    /// Parsed code, if any
    pub fn parse_code(&self) -> GenesisResult<Option<Bytes>> {
        let Some(code) = &self.code else {
            return Ok(None);
        };
        let code = code.trim();
        let code = code.strip_prefix("0x").unwrap_or(code);
        hex::decode(code)
            .map(|bytes| Some(Bytes::from(bytes)))
            .map_err(|e| GenesisError::InvalidConfig(format!("invalid code: {e}")))
    }

    /// Parsed storage entries
    pub fn parse_storage(&self) -> GenesisResult<Vec<(H256, H256)>> {
        self.storage
            .iter()
            .map(|(key, value)| Ok((parse_word(key)?, parse_word(value)?)))
            .collect()
    }
}

fn parse_quantity(s: &str) -> GenesisResult<U256> {
    parse_u256(s).map_err(|e| GenesisError::InvalidConfig(e.to_string()))
}

fn parse_word(s: &str) -> GenesisResult<H256> {
    H256::from_hex(s.trim()).map_err(|e| GenesisError::InvalidConfig(format!("invalid word {s}: {e}")))
}

impl GenesisConfig {
    /// Parse a genesis document
    pub fn from_json(json: &str) -> GenesisResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a genesis file
    pub fn load(path: impl AsRef<Path>) -> GenesisResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write the allocations, parameters and executor into `state`
    pub fn apply(&self, state: &mut State) -> GenesisResult<()> {
        info!(accounts = self.alloc.len(), params = self.params.len(), "applying genesis state");

        for (addr_str, account) in &self.alloc {
            let address = Address::from_hex(addr_str.trim())
                .map_err(|_| GenesisError::InvalidConfig(format!("invalid address: {addr_str}")))?;

            let balance = account.parse_balance()?;
            let energy = account.parse_energy()?;
            state.set_balance(address, balance, self.timestamp)?;
            energy::set_balance(state, self.timestamp, address, energy)?;

            if let Some(code) = account.parse_code()? {
                state.set_code(address, code)?;
            }
            for (key, value) in account.parse_storage()? {
                state.set_storage(address, key, value);
            }

            debug!(%address, %balance, %energy, "genesis allocation");
        }

        for (name, value) in &self.params {
            let key = H256::from_short(name.as_bytes())
                .map_err(|_| GenesisError::InvalidConfig(format!("param name too long: {name}")))?;
            params::set(state, key, parse_quantity(value)?);
        }

        if let Some(executor) = self.executor {
            params::set(state, params::KEY_EXECUTOR, volt_primitives::h256_to_u256(&executor.to_word()));
        }
        Ok(())
    }
}

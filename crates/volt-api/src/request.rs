//! Transaction requests
//!
//! A request carries everything needed to build and sign a transaction. Large
//! quantities accept decimal or 0x-hex strings.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use volt_crypto::PrivateKey;
use volt_primitives::{parse_u256, Address, U256};
use volt_types::{Clause, Transaction, TransactionBuilder};

use crate::error::{ApiError, ApiResult};
use crate::types::parse_hex_bytes;

/// One clause of a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseRequest {
    /// Recipient, absent for contract creation
    #[serde(default)]
    pub to: Option<Address>,
    /// Value to send
    #[serde(default)]
    pub value: String,
    /// Input data or init code, hex
    #[serde(default)]
    pub data: String,
}

impl ClauseRequest {
    /// Parse into a clause
    pub fn to_clause(&self) -> ApiResult<Clause> {
        let value = parse_u256(&self.value).map_err(|e| ApiError::invalid("value", e))?;
        let data = parse_hex_bytes("data", &self.data)?;
        Ok(Clause::new(self.to, value, Bytes::from(data)))
    }
}

/// Transaction to sign and execute
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Signing key, hex
    pub private_key: String,
    /// Clauses in execution order
    #[serde(default)]
    pub clauses: Vec<ClauseRequest>,
    /// Gas limit
    pub gas: u64,
    /// Gas price
    #[serde(default)]
    pub gas_price: String,
    /// Nonce
    #[serde(default)]
    pub nonce: u64,
    /// Chain tag
    #[serde(default)]
    pub chain_tag: u8,
    /// Block reference
    #[serde(default)]
    pub block_ref: u64,
    /// Expiration in blocks
    #[serde(default)]
    pub expiration: u32,
}

impl TransactionRequest {
    /// Parse a request document
    pub fn from_json(json: &str) -> ApiResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode the signing key
    pub fn private_key(&self) -> ApiResult<PrivateKey> {
        let bytes = parse_hex_bytes("privateKey", &self.private_key)?;
        PrivateKey::from_slice(&bytes).map_err(|e| ApiError::invalid("privateKey", e))
    }

    /// Parsed gas price
    pub fn gas_price(&self) -> ApiResult<U256> {
        parse_u256(&self.gas_price).map_err(|e| ApiError::invalid("gasPrice", e))
    }

    /// Build the unsigned transaction
    pub fn build(&self) -> ApiResult<Transaction> {
        let clauses = self
            .clauses
            .iter()
            .map(ClauseRequest::to_clause)
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(TransactionBuilder::new()
            .chain_tag(self.chain_tag)
            .block_ref(self.block_ref)
            .expiration(self.expiration)
            .clauses(clauses)
            .gas_price(self.gas_price()?)
            .gas(self.gas)
            .nonce(self.nonce)
            .build()?)
    }

    /// Build and sign the transaction
    pub fn sign(&self) -> ApiResult<Transaction> {
        let key = self.private_key()?;
        Ok(self.build()?.sign(&key)?)
    }
}

//! Transaction types for Volt
//!
//! A transaction carries an ordered list of clauses that execute atomically.
//! The origin is never stored; it is recovered from the signature.

use bytes::Bytes;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use volt_crypto::{keccak256, keccak256_concat, recover_address, sign, PrivateKey, Signature};
use volt_primitives::{Address, H256, U256};

use crate::{gas, Result, TxError};

/// One action inside a transaction
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Clause {
    /// Recipient (None for contract creation)
    pub to: Option<Address>,
    /// Value to transfer
    pub value: U256,
    /// Call data, or init code for a creation
    pub data: Bytes,
}

impl Clause {
    /// Create a clause
    pub fn new(to: Option<Address>, value: U256, data: Bytes) -> Self {
        Self { to, value, data }
    }

    /// Plain call to `to` with no value
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self::new(Some(to), U256::zero(), data.into())
    }

    /// Value transfer with no payload
    pub fn transfer(to: Address, value: U256) -> Self {
        Self::new(Some(to), value, Bytes::new())
    }

    /// Contract creation from init code
    pub fn create(code: impl Into<Bytes>) -> Self {
        Self::new(None, U256::zero(), code.into())
    }

    /// Attach a value
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Check if this clause deploys a contract
    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}

impl Encodable for Clause {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        match &self.to {
            Some(to) => s.append(to),
            None => s.append_empty_data(),
        };
        s.append(&self.value);
        s.encoder().encode_value(&self.data);
    }
}

impl Decodable for Clause {
    fn decode(rlp: &Rlp) -> std::result::Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let to_item = rlp.at(0)?;
        let to = if to_item.is_empty() {
            None
        } else {
            Some(to_item.as_val()?)
        };
        Ok(Clause {
            to,
            value: rlp.val_at(1)?,
            data: decode_bytes(&rlp.at(2)?)?,
        })
    }
}

/// Signed (or not yet signed) multi-clause transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    chain_tag: u8,
    block_ref: u64,
    expiration: u32,
    clauses: Vec<Clause>,
    gas_price: U256,
    gas: u64,
    depends_on: Option<H256>,
    nonce: u64,
    signature: Bytes,
}

impl Transaction {
    /// Last byte of the genesis block id
    pub fn chain_tag(&self) -> u8 {
        self.chain_tag
    }

    /// First eight bytes of the reference block id
    pub fn block_ref(&self) -> u64 {
        self.block_ref
    }

    /// Number of blocks after `block_ref` the transaction stays valid
    pub fn expiration(&self) -> u32 {
        self.expiration
    }

    /// Clauses in execution order
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Price of one unit of gas, in energy
    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    /// Gas limit
    pub fn gas(&self) -> u64 {
        self.gas
    }

    /// Transaction this one depends on
    pub fn depends_on(&self) -> Option<H256> {
        self.depends_on
    }

    /// Nonce
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Raw 65-byte signature, empty when unsigned
    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    /// Hash covering every field except the signature
    pub fn signing_hash(&self) -> H256 {
        let mut s = RlpStream::new();
        self.append_unsigned(&mut s, 8);
        keccak256(&s.out())
    }

    /// Recover the signer
    pub fn origin(&self) -> Result<Address> {
        let signature = Signature::from_slice(&self.signature)?;
        Ok(recover_address(&self.signing_hash(), &signature)?)
    }

    /// Transaction id: `keccak256(signing_hash ‖ origin)`
    pub fn id(&self) -> Result<H256> {
        let origin = self.origin()?;
        Ok(self.id_for(&origin))
    }

    /// Transaction id for an already recovered origin
    pub fn id_for(&self, origin: &Address) -> H256 {
        let signing_hash = self.signing_hash();
        keccak256_concat(&[&signing_hash.as_bytes()[..], &origin.as_bytes()[..]])
    }

    /// Intrinsic gas of this transaction's clauses
    pub fn intrinsic_gas(&self) -> Result<u64> {
        gas::intrinsic_gas(&self.clauses)
    }

    /// Replace the signature
    pub fn with_signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }

    /// Sign with a private key
    pub fn sign(self, key: &PrivateKey) -> Result<Self> {
        let signature = sign(&self.signing_hash(), key)?;
        Ok(self.with_signature(Bytes::copy_from_slice(&signature.to_bytes())))
    }

    /// Hash of the full signed encoding
    pub fn hash(&self) -> H256 {
        keccak256(&rlp::encode(self))
    }

    fn append_unsigned(&self, s: &mut RlpStream, fields: usize) {
        s.begin_list(fields);
        s.append(&self.chain_tag);
        s.append(&self.block_ref);
        s.append(&self.expiration);
        s.append_list(&self.clauses);
        s.append(&self.gas_price);
        s.append(&self.gas);
        match &self.depends_on {
            Some(hash) => s.append(hash),
            None => s.append_empty_data(),
        };
        s.append(&self.nonce);
    }
}

impl Encodable for Transaction {
    fn rlp_append(&self, s: &mut RlpStream) {
        self.append_unsigned(s, 9);
        s.encoder().encode_value(&self.signature);
    }
}

impl Decodable for Transaction {
    fn decode(rlp: &Rlp) -> std::result::Result<Self, DecoderError> {
        if rlp.item_count()? != 9 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let depends_item = rlp.at(6)?;
        let depends_on = if depends_item.is_empty() {
            None
        } else {
            Some(depends_item.as_val()?)
        };
        Ok(Transaction {
            chain_tag: rlp.val_at(0)?,
            block_ref: rlp.val_at(1)?,
            expiration: rlp.val_at(2)?,
            clauses: rlp.list_at(3)?,
            gas_price: rlp.val_at(4)?,
            gas: rlp.val_at(5)?,
            depends_on,
            nonce: rlp.val_at(7)?,
            signature: decode_bytes(&rlp.at(8)?)?,
        })
    }
}

impl Transaction {
    /// Decode a transaction from its RLP encoding
    pub fn decode_rlp(bytes: &[u8]) -> Result<Self> {
        Ok(rlp::decode(bytes)?)
    }
}

fn decode_bytes(rlp: &Rlp) -> std::result::Result<Bytes, DecoderError> {
    rlp.decoder().decode_value(|bytes| Ok(Bytes::copy_from_slice(bytes)))
}

/// Transaction builder with fluent API
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    chain_tag: u8,
    block_ref: u64,
    expiration: u32,
    clauses: Vec<Clause>,
    gas_price: U256,
    gas: Option<u64>,
    depends_on: Option<H256>,
    nonce: u64,
}

impl TransactionBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chain tag
    pub fn chain_tag(mut self, tag: u8) -> Self {
        self.chain_tag = tag;
        self
    }

    /// Set the reference block
    pub fn block_ref(mut self, block_ref: u64) -> Self {
        self.block_ref = block_ref;
        self
    }

    /// Set the expiration
    pub fn expiration(mut self, expiration: u32) -> Self {
        self.expiration = expiration;
        self
    }

    /// Append a clause
    pub fn clause(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Append several clauses
    pub fn clauses(mut self, clauses: impl IntoIterator<Item = Clause>) -> Self {
        self.clauses.extend(clauses);
        self
    }

    /// Set the gas price
    pub fn gas_price(mut self, price: U256) -> Self {
        self.gas_price = price;
        self
    }

    /// Set the gas limit
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Set the dependency
    pub fn depends_on(mut self, id: H256) -> Self {
        self.depends_on = Some(id);
        self
    }

    /// Set the nonce
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Build an unsigned transaction
    pub fn build(self) -> Result<Transaction> {
        let gas = self.gas.ok_or(TxError::MissingField("gas"))?;
        Ok(Transaction {
            chain_tag: self.chain_tag,
            block_ref: self.block_ref,
            expiration: self.expiration,
            clauses: self.clauses,
            gas_price: self.gas_price,
            gas,
            depends_on: self.depends_on,
            nonce: self.nonce,
            signature: Bytes::new(),
        })
    }

    /// Build and sign
    pub fn sign(self, key: &PrivateKey) -> Result<Transaction> {
        self.build()?.sign(key)
    }
}

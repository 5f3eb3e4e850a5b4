//! Minimal Solidity ABI for native contracts
//!
//! Native methods only take static arguments, so decoding reads whole words
//! in order. Return values may include a dynamic `string`.

use std::collections::HashMap;

use volt_crypto::keccak256;
use volt_evm::{VmError, VmResult};
use volt_primitives::{Address, H256, U256};

/// Selector of the standard `Error(string)` revert payload
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Compute function selector (first 4 bytes of keccak256(signature))
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

/// Topic of an event, keccak256 of its signature
pub fn event_topic(signature: &str) -> H256 {
    keccak256(signature.as_bytes())
}

/// Selector to method lookup for one contract
pub type FunctionTable<M> = HashMap<[u8; 4], M>;

/// Build a table from `(signature, method)` pairs
pub fn function_table<M: Copy>(entries: &[(&str, M)]) -> FunctionTable<M> {
    entries
        .iter()
        .map(|(signature, method)| (function_selector(signature), *method))
        .collect()
}

/// Split call data into its selector and argument words
pub fn split_selector(input: &[u8]) -> Option<([u8; 4], &[u8])> {
    if input.len() < 4 {
        return None;
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&input[..4]);
    Some((selector, &input[4..]))
}

/// A value that occupies exactly one ABI word
pub trait AbiWord: Sized {
    /// Decode from a word, rejecting non-canonical encodings
    fn from_word(word: &[u8; 32]) -> VmResult<Self>;
}

impl AbiWord for U256 {
    fn from_word(word: &[u8; 32]) -> VmResult<Self> {
        Ok(U256::from_big_endian(word))
    }
}

impl AbiWord for H256 {
    fn from_word(word: &[u8; 32]) -> VmResult<Self> {
        Ok(H256::from_bytes(*word))
    }
}

impl AbiWord for Address {
    fn from_word(word: &[u8; 32]) -> VmResult<Self> {
        if word[..12].iter().any(|b| *b != 0) {
            return Err(VmError::InvalidInput);
        }
        Ok(Address::from_word(&H256::from_bytes(*word)))
    }
}

impl AbiWord for bool {
    fn from_word(word: &[u8; 32]) -> VmResult<Self> {
        match U256::from_big_endian(word) {
            v if v.is_zero() => Ok(false),
            v if v == U256::one() => Ok(true),
            _ => Err(VmError::InvalidInput),
        }
    }
}

/// Sequential reader over argument words
#[derive(Debug)]
pub struct Args<'a> {
    data: &'a [u8],
}

impl<'a> Args<'a> {
    /// Read arguments from `data` (call data without the selector)
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Decode the next argument
    pub fn read<T: AbiWord>(&mut self) -> VmResult<T> {
        if self.data.len() < 32 {
            return Err(VmError::InvalidInput);
        }
        let (head, rest) = self.data.split_at(32);
        let mut word = [0u8; 32];
        word.copy_from_slice(head);
        self.data = rest;
        T::from_word(&word)
    }
}

/// ABI token used for return values and test call data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Address
    Address(Address),
    /// uint256
    Uint(U256),
    /// Boolean
    Bool(bool),
    /// bytes32
    FixedBytes(H256),
    /// UTF-8 string
    String(String),
}

impl Token {
    fn head(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            Token::Address(address) => word[12..].copy_from_slice(address.as_bytes()),
            Token::Uint(value) => value.to_big_endian(&mut word),
            Token::Bool(value) => word[31] = u8::from(*value),
            Token::FixedBytes(hash) => word.copy_from_slice(hash.as_bytes()),
            Token::String(_) => {}
        }
        word
    }
}

fn u256_word(value: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    U256::from(value).to_big_endian(&mut word);
    word
}

/// Encode tokens with the Solidity ABI head/tail layout
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_size = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::String(s) => {
                head.extend_from_slice(&u256_word(head_size + tail.len()));
                tail.extend_from_slice(&u256_word(s.len()));
                let padded_len = s.len().div_ceil(32) * 32;
                let mut padded = vec![0u8; padded_len];
                padded[..s.len()].copy_from_slice(s.as_bytes());
                tail.extend(padded);
            }
            _ => head.extend_from_slice(&token.head()),
        }
    }

    head.extend(tail);
    head
}

/// Encode function call (selector + params)
pub fn encode_function_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut result = function_selector(signature).to_vec();
    result.extend(encode(tokens));
    result
}

/// Revert carrying a standard `Error(string)` payload
pub fn revert(reason: &str) -> VmError {
    let mut data = ERROR_SELECTOR.to_vec();
    data.extend(encode(&[Token::String(reason.to_string())]));
    VmError::Revert(data)
}

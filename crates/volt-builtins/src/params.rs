//! Governance parameters
//!
//! Values are `uint256` words stored under `bytes32` keys in the params
//! account's storage. Only the executor, itself a parameter, may change them.

use bytes::Bytes;
use volt_evm::{NativeCall, NativeContract, VmResult};
use volt_primitives::{h256_to_u256, u256_to_h256, Address, H256, U256};
use volt_storage::{State, StorageResult};

use crate::abi::{self, Args, FunctionTable, Token};
use crate::{PARAMS, READ_GAS, WRITE_GAS};

/// Left-aligned ASCII key, as a Solidity `bytes32` literal
const fn short_key(name: &[u8]) -> H256 {
    let mut bytes = [0u8; 32];
    let mut i = 0;
    while i < name.len() {
        bytes[i] = name[i];
        i += 1;
    }
    H256::from_bytes(bytes)
}

/// Key of the executor address
pub const KEY_EXECUTOR: H256 = short_key(b"executor");

/// Read a parameter (zero when unset)
pub fn get(state: &State, key: &H256) -> StorageResult<U256> {
    Ok(h256_to_u256(&state.storage(&PARAMS, key)?))
}

/// Write a parameter
pub fn set(state: &mut State, key: H256, value: U256) {
    state.set_storage(PARAMS, key, u256_to_h256(value));
}

/// Current executor, zero when none is configured
pub fn executor(state: &State) -> StorageResult<Address> {
    Ok(Address::from_word(&u256_to_h256(get(state, &KEY_EXECUTOR)?)))
}

#[derive(Clone, Copy, Debug)]
enum Method {
    Get,
    Set,
}

/// Native params contract
pub struct Params {
    table: FunctionTable<Method>,
}

impl Params {
    /// Create the contract with its method table
    pub fn new() -> Self {
        Self {
            table: abi::function_table(&[
                ("get(bytes32)", Method::Get),
                ("set(bytes32,uint256)", Method::Set),
            ]),
        }
    }

    fn dispatch(&self, method: Method, mut args: Args<'_>, call: &mut NativeCall<'_>) -> VmResult<Vec<u8>> {
        match method {
            Method::Get => {
                call.charge(READ_GAS)?;
                let key = args.read::<H256>()?;
                let value = get(call.state(), &key)?;
                Ok(abi::encode(&[Token::Uint(value)]))
            }
            Method::Set => {
                call.charge(WRITE_GAS)?;
                call.ensure_writable()?;
                let key = args.read::<H256>()?;
                let value = args.read::<U256>()?;
                if call.caller() != executor(call.state())? {
                    return Err(abi::revert("params: executor required"));
                }
                set(call.state_mut(), key, value);
                call.log(
                    vec![abi::event_topic("Set(bytes32,uint256)"), key],
                    Bytes::from(abi::encode(&[Token::Uint(value)])),
                );
                Ok(Vec::new())
            }
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeContract for Params {
    fn run(&self, input: &[u8], call: &mut NativeCall<'_>) -> Option<VmResult<Vec<u8>>> {
        let (selector, data) = abi::split_selector(input)?;
        let method = *self.table.get(&selector)?;
        Some(self.dispatch(method, Args::new(data), call))
    }
}

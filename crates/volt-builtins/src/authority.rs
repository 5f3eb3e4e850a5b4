//! Block signer registry
//!
//! Each listed signer has an endorsor and an identity. Entries live in the
//! authority account's storage, three slots per signer.

use bytes::Bytes;
use volt_crypto::keccak256_concat;
use volt_evm::{NativeCall, NativeContract, VmResult};
use volt_primitives::{Address, H256};
use volt_storage::{State, StorageResult};

use crate::abi::{self, Args, FunctionTable, Token};
use crate::{params, AUTHORITY, READ_GAS, WRITE_GAS};

const FIELD_LISTED: u8 = 0;
const FIELD_ENDORSOR: u8 = 1;
const FIELD_IDENTITY: u8 = 2;

fn slot(signer: &Address, field: u8) -> H256 {
    keccak256_concat(&[&signer.as_bytes()[..], &[field]])
}

/// One registered signer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Block signing address
    pub signer: Address,
    /// Account that vouches for the signer
    pub endorsor: Address,
    /// Free-form identity
    pub identity: H256,
}

/// Look up a signer
pub fn get(state: &State, signer: &Address) -> StorageResult<Option<Candidate>> {
    if state.storage(&AUTHORITY, &slot(signer, FIELD_LISTED))?.is_zero() {
        return Ok(None);
    }
    let endorsor = state.storage(&AUTHORITY, &slot(signer, FIELD_ENDORSOR))?;
    let identity = state.storage(&AUTHORITY, &slot(signer, FIELD_IDENTITY))?;
    Ok(Some(Candidate {
        signer: *signer,
        endorsor: Address::from_word(&endorsor),
        identity,
    }))
}

/// List a signer. Returns false if it is already listed.
pub fn add(state: &mut State, candidate: Candidate) -> StorageResult<bool> {
    if get(state, &candidate.signer)?.is_some() {
        return Ok(false);
    }
    let signer = candidate.signer;
    let mut listed = [0u8; 32];
    listed[31] = 1;
    state.set_storage(AUTHORITY, slot(&signer, FIELD_LISTED), H256::from_bytes(listed));
    state.set_storage(AUTHORITY, slot(&signer, FIELD_ENDORSOR), candidate.endorsor.to_word());
    state.set_storage(AUTHORITY, slot(&signer, FIELD_IDENTITY), candidate.identity);
    Ok(true)
}

/// Remove a signer. Returns false if it was not listed.
pub fn revoke(state: &mut State, signer: &Address) -> StorageResult<bool> {
    if get(state, signer)?.is_none() {
        return Ok(false);
    }
    for field in [FIELD_LISTED, FIELD_ENDORSOR, FIELD_IDENTITY] {
        state.set_storage(AUTHORITY, slot(signer, field), H256::ZERO);
    }
    Ok(true)
}

#[derive(Clone, Copy, Debug)]
enum Method {
    Add,
    Revoke,
    Get,
}

/// Native authority contract
pub struct Authority {
    table: FunctionTable<Method>,
}

impl Authority {
    /// Create the contract with its method table
    pub fn new() -> Self {
        Self {
            table: abi::function_table(&[
                ("add(address,address,bytes32)", Method::Add),
                ("revoke(address)", Method::Revoke),
                ("get(address)", Method::Get),
            ]),
        }
    }

    fn dispatch(&self, method: Method, mut args: Args<'_>, call: &mut NativeCall<'_>) -> VmResult<Vec<u8>> {
        match method {
            Method::Get => {
                call.charge(READ_GAS)?;
                let signer = args.read::<Address>()?;
                let tokens = match get(call.state(), &signer)? {
                    Some(candidate) => [
                        Token::Bool(true),
                        Token::Address(candidate.endorsor),
                        Token::FixedBytes(candidate.identity),
                    ],
                    None => [
                        Token::Bool(false),
                        Token::Address(Address::ZERO),
                        Token::FixedBytes(H256::ZERO),
                    ],
                };
                Ok(abi::encode(&tokens))
            }
            Method::Add => {
                call.charge(WRITE_GAS)?;
                call.ensure_writable()?;
                let candidate = Candidate {
                    signer: args.read()?,
                    endorsor: args.read()?,
                    identity: args.read()?,
                };
                Self::require_executor(call)?;
                let signer = candidate.signer;
                if !add(call.state_mut(), candidate)? {
                    return Err(abi::revert("authority: already listed"));
                }
                Self::emit(call, &signer, "added");
                Ok(Vec::new())
            }
            Method::Revoke => {
                call.charge(WRITE_GAS)?;
                call.ensure_writable()?;
                let signer = args.read::<Address>()?;
                Self::require_executor(call)?;
                if !revoke(call.state_mut(), &signer)? {
                    return Err(abi::revert("authority: not listed"));
                }
                Self::emit(call, &signer, "revoked");
                Ok(Vec::new())
            }
        }
    }

    fn require_executor(call: &NativeCall<'_>) -> VmResult<()> {
        if call.caller() != params::executor(call.state())? {
            return Err(abi::revert("authority: executor required"));
        }
        Ok(())
    }

    fn emit(call: &mut NativeCall<'_>, signer: &Address, action: &str) {
        // action is a bytes32 literal, left-aligned
        let mut word = [0u8; 32];
        word[..action.len()].copy_from_slice(action.as_bytes());
        call.log(
            vec![abi::event_topic("Candidate(address,bytes32)"), signer.to_word()],
            Bytes::copy_from_slice(&word),
        );
    }
}

impl Default for Authority {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeContract for Authority {
    fn run(&self, input: &[u8], call: &mut NativeCall<'_>) -> Option<VmResult<Vec<u8>>> {
        let (selector, data) = abi::split_selector(input)?;
        let method = *self.table.get(&selector)?;
        Some(self.dispatch(method, Args::new(data), call))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use volt_evm::VmError;
    use volt_primitives::{h256_to_u256, U256};
    use volt_storage::MemoryBackend;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn state_with_executor() -> State {
        let mut state = State::new(Arc::new(MemoryBackend::new()));
        params::set(&mut state, params::KEY_EXECUTOR, h256_to_u256(&addr(0xec).to_word()));
        state
    }

    fn run(state: &mut State, caller: Address, input: &[u8]) -> VmResult<Vec<u8>> {
        let mut call = NativeCall::new(state, AUTHORITY, caller, U256::zero(), false, 0, 10_000);
        Authority::new().run(input, &mut call).expect("method should be known")
    }

    fn add_call(signer: Address) -> Vec<u8> {
        abi::encode_function_call(
            "add(address,address,bytes32)",
            &[
                Token::Address(signer),
                Token::Address(addr(0xe0)),
                Token::FixedBytes(H256::from_bytes([0x1d; 32])),
            ],
        )
    }

    #[test]
    fn test_add_get_revoke_rust_api() {
        let mut state = state_with_executor();
        let candidate = Candidate {
            signer: addr(1),
            endorsor: addr(2),
            identity: H256::from_bytes([3; 32]),
        };
        assert!(add(&mut state, candidate.clone()).unwrap());
        assert!(!add(&mut state, candidate.clone()).unwrap());
        assert_eq!(get(&state, &addr(1)).unwrap(), Some(candidate));
        assert!(revoke(&mut state, &addr(1)).unwrap());
        assert!(!revoke(&mut state, &addr(1)).unwrap());
        assert_eq!(get(&state, &addr(1)).unwrap(), None);
    }

    #[test]
    fn test_executor_adds_via_abi() {
        let mut state = state_with_executor();
        run(&mut state, addr(0xec), &add_call(addr(1))).unwrap();

        let out = run(&mut state, addr(9), &abi::encode_function_call("get(address)", &[Token::Address(addr(1))]))
            .unwrap();
        assert_eq!(
            out,
            abi::encode(&[
                Token::Bool(true),
                Token::Address(addr(0xe0)),
                Token::FixedBytes(H256::from_bytes([0x1d; 32])),
            ])
        );
    }

    #[test]
    fn test_duplicate_add_reverts() {
        let mut state = state_with_executor();
        run(&mut state, addr(0xec), &add_call(addr(1))).unwrap();
        let err = run(&mut state, addr(0xec), &add_call(addr(1))).unwrap_err();
        assert_eq!(err, abi::revert("authority: already listed"));
    }

    #[test]
    fn test_non_executor_rejected() {
        let mut state = state_with_executor();
        let err = run(&mut state, addr(7), &add_call(addr(1))).unwrap_err();
        assert!(matches!(err, VmError::Revert(_)));
        assert_eq!(get(&state, &addr(1)).unwrap(), None);
    }

    #[test]
    fn test_revoke_unlisted_reverts() {
        let mut state = state_with_executor();
        let input = abi::encode_function_call("revoke(address)", &[Token::Address(addr(1))]);
        let err = run(&mut state, addr(0xec), &input).unwrap_err();
        assert_eq!(err, abi::revert("authority: not listed"));
    }
}

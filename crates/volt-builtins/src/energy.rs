//! Energy token
//!
//! Balances are the accounts' own growing `energy` field. Allowances and
//! sponsorships are kept in the energy account's storage.

use bytes::Bytes;
use tracing::trace;
use volt_crypto::keccak256_concat;
use volt_evm::{NativeCall, NativeContract, VmResult};
use volt_primitives::{h256_to_u256, u256_to_h256, Address, H256, U256};
use volt_storage::{State, StorageError, StorageResult};

use crate::abi::{self, Args, FunctionTable, Token};
use crate::{ENERGY, READ_GAS, WRITE_GAS};

/// Token name
pub const NAME: &str = "VeThor";
/// Token symbol
pub const SYMBOL: &str = "VTHO";
/// Token decimals
pub const DECIMALS: u8 = 18;

fn allowance_slot(owner: &Address, spender: &Address) -> H256 {
    keccak256_concat(&[&b"allowance"[..], &owner.as_bytes()[..], &spender.as_bytes()[..]])
}

fn sponsor_slot(target: &Address) -> H256 {
    keccak256_concat(&[&b"sponsor"[..], &target.as_bytes()[..]])
}

/// Energy of `address` at `time`
pub fn get_balance(state: &State, time: u64, address: &Address) -> StorageResult<U256> {
    state.energy(address, time)
}

/// Overwrite the energy of `address` as of `time`
pub fn set_balance(state: &mut State, time: u64, address: Address, amount: U256) -> StorageResult<()> {
    state.set_energy(address, amount, time)
}

/// Credit `amount` to `address`
pub fn add_balance(state: &mut State, time: u64, address: Address, amount: U256) -> StorageResult<()> {
    let balance = get_balance(state, time, &address)?;
    let credited = balance
        .checked_add(amount)
        .ok_or(StorageError::BalanceOverflow(address))?;
    set_balance(state, time, address, credited)
}

/// Debit `amount` from `address`. Returns false, writing nothing, if the balance is short.
pub fn sub_balance(state: &mut State, time: u64, address: Address, amount: U256) -> StorageResult<bool> {
    let balance = get_balance(state, time, &address)?;
    if balance < amount {
        return Ok(false);
    }
    set_balance(state, time, address, balance - amount)?;
    Ok(true)
}

/// Account that volunteered to pay gas for transactions aimed at `target`
pub fn sponsor_of(state: &State, target: &Address) -> StorageResult<Option<Address>> {
    let word = state.storage(&ENERGY, &sponsor_slot(target))?;
    Ok((!word.is_zero()).then(|| Address::from_word(&word)))
}

fn set_sponsor(state: &mut State, target: &Address, sponsor: Option<Address>) {
    let word = sponsor.map(|s| s.to_word()).unwrap_or(H256::ZERO);
    state.set_storage(ENERGY, sponsor_slot(target), word);
}

/// How much `spender` may move out of `owner`'s balance
pub fn allowance(state: &State, owner: &Address, spender: &Address) -> StorageResult<U256> {
    Ok(h256_to_u256(&state.storage(&ENERGY, &allowance_slot(owner, spender))?))
}

fn set_allowance(state: &mut State, owner: &Address, spender: &Address, amount: U256) {
    state.set_storage(ENERGY, allowance_slot(owner, spender), u256_to_h256(amount));
}

/// Charge `amount` of energy for a transaction sent by `origin`.
///
/// When `hint` names a sponsored recipient whose sponsor can cover `amount`,
/// the sponsor pays. Otherwise the origin pays if it can. Returns the paying
/// address and whether the debit happened; on failure state is untouched and
/// the origin is reported.
pub fn consume(
    state: &mut State,
    time: u64,
    origin: Address,
    hint: Address,
    amount: U256,
) -> StorageResult<(Address, bool)> {
    if !hint.is_zero() {
        if let Some(sponsor) = sponsor_of(state, &hint)? {
            if sub_balance(state, time, sponsor, amount)? {
                trace!(%sponsor, target = %hint, "energy consumed from sponsor");
                return Ok((sponsor, true));
            }
        }
    }
    let ok = sub_balance(state, time, origin, amount)?;
    Ok((origin, ok))
}

#[derive(Clone, Copy, Debug)]
enum Method {
    Name,
    Symbol,
    Decimals,
    BalanceOf,
    Transfer,
    Approve,
    Allowance,
    TransferFrom,
    Sponsor,
    Unsponsor,
    SponsorOf,
}

/// Native energy contract
pub struct Energy {
    table: FunctionTable<Method>,
}

impl Energy {
    /// Create the contract with its method table
    pub fn new() -> Self {
        Self {
            table: abi::function_table(&[
                ("name()", Method::Name),
                ("symbol()", Method::Symbol),
                ("decimals()", Method::Decimals),
                ("balanceOf(address)", Method::BalanceOf),
                ("transfer(address,uint256)", Method::Transfer),
                ("approve(address,uint256)", Method::Approve),
                ("allowance(address,address)", Method::Allowance),
                ("transferFrom(address,address,uint256)", Method::TransferFrom),
                ("sponsor(address)", Method::Sponsor),
                ("unsponsor(address)", Method::Unsponsor),
                ("sponsorOf(address)", Method::SponsorOf),
            ]),
        }
    }

    fn dispatch(&self, method: Method, mut args: Args<'_>, call: &mut NativeCall<'_>) -> VmResult<Vec<u8>> {
        let time = call.time();
        match method {
            Method::Name => Ok(abi::encode(&[Token::String(NAME.to_string())])),
            Method::Symbol => Ok(abi::encode(&[Token::String(SYMBOL.to_string())])),
            Method::Decimals => Ok(abi::encode(&[Token::Uint(U256::from(DECIMALS))])),
            Method::BalanceOf => {
                call.charge(READ_GAS)?;
                let owner = args.read::<Address>()?;
                let balance = get_balance(call.state(), time, &owner)?;
                Ok(abi::encode(&[Token::Uint(balance)]))
            }
            Method::Allowance => {
                call.charge(READ_GAS)?;
                let owner = args.read::<Address>()?;
                let spender = args.read::<Address>()?;
                let amount = allowance(call.state(), &owner, &spender)?;
                Ok(abi::encode(&[Token::Uint(amount)]))
            }
            Method::SponsorOf => {
                call.charge(READ_GAS)?;
                let target = args.read::<Address>()?;
                let sponsor = sponsor_of(call.state(), &target)?.unwrap_or(Address::ZERO);
                Ok(abi::encode(&[Token::Address(sponsor)]))
            }
            Method::Transfer => {
                Self::begin_write(call)?;
                let to = args.read::<Address>()?;
                let amount = args.read::<U256>()?;
                let from = call.caller();
                Self::move_energy(call, from, to, amount)?;
                Ok(abi::encode(&[Token::Bool(true)]))
            }
            Method::Approve => {
                Self::begin_write(call)?;
                let spender = args.read::<Address>()?;
                let amount = args.read::<U256>()?;
                let owner = call.caller();
                set_allowance(call.state_mut(), &owner, &spender, amount);
                call.log(
                    vec![abi::event_topic("Approval(address,address,uint256)"), owner.to_word(), spender.to_word()],
                    Bytes::from(abi::encode(&[Token::Uint(amount)])),
                );
                Ok(abi::encode(&[Token::Bool(true)]))
            }
            Method::TransferFrom => {
                Self::begin_write(call)?;
                let from = args.read::<Address>()?;
                let to = args.read::<Address>()?;
                let amount = args.read::<U256>()?;
                let spender = call.caller();
                let allowed = allowance(call.state(), &from, &spender)?;
                if allowed < amount {
                    return Err(abi::revert("energy: insufficient allowance"));
                }
                set_allowance(call.state_mut(), &from, &spender, allowed - amount);
                Self::move_energy(call, from, to, amount)?;
                Ok(abi::encode(&[Token::Bool(true)]))
            }
            Method::Sponsor => {
                Self::begin_write(call)?;
                let target = args.read::<Address>()?;
                let sponsor = call.caller();
                set_sponsor(call.state_mut(), &target, Some(sponsor));
                Self::emit_sponsor(call, &target, &sponsor, true);
                Ok(Vec::new())
            }
            Method::Unsponsor => {
                Self::begin_write(call)?;
                let target = args.read::<Address>()?;
                let caller = call.caller();
                if sponsor_of(call.state(), &target)? != Some(caller) {
                    return Err(abi::revert("energy: not the sponsor"));
                }
                set_sponsor(call.state_mut(), &target, None);
                Self::emit_sponsor(call, &target, &caller, false);
                Ok(Vec::new())
            }
        }
    }

    fn begin_write(call: &mut NativeCall<'_>) -> VmResult<()> {
        call.charge(WRITE_GAS)?;
        call.ensure_writable()
    }

    fn move_energy(call: &mut NativeCall<'_>, from: Address, to: Address, amount: U256) -> VmResult<()> {
        let time = call.time();
        if !sub_balance(call.state_mut(), time, from, amount)? {
            return Err(abi::revert("energy: insufficient balance"));
        }
        add_balance(call.state_mut(), time, to, amount)?;
        call.log(
            vec![abi::event_topic("Transfer(address,address,uint256)"), from.to_word(), to.to_word()],
            Bytes::from(abi::encode(&[Token::Uint(amount)])),
        );
        Ok(())
    }

    fn emit_sponsor(call: &mut NativeCall<'_>, target: &Address, sponsor: &Address, sponsored: bool) {
        call.log(
            vec![abi::event_topic("Sponsor(address,address,bool)"), target.to_word(), sponsor.to_word()],
            Bytes::from(abi::encode(&[Token::Bool(sponsored)])),
        );
    }
}

impl Default for Energy {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeContract for Energy {
    fn run(&self, input: &[u8], call: &mut NativeCall<'_>) -> Option<VmResult<Vec<u8>>> {
        let (selector, data) = abi::split_selector(input)?;
        let method = *self.table.get(&selector)?;
        Some(self.dispatch(method, Args::new(data), call))
    }
}

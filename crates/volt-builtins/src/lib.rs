//! # volt-builtins
//!
//! Native contracts living at fixed addresses.
//!
//! This crate provides:
//! - [`Authority`]: the executor-managed list of block signers
//! - [`Params`]: governance parameters keyed by `bytes32`
//! - [`Energy`]: the energy token, its allowances and gas sponsorship
//! - [`hook_all`] to register all three on a [`Vm`]
//!
//! Each contract also exposes a plain Rust API over [`volt_storage::State`]
//! for the runtime and genesis setup.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
pub mod authority;
pub mod energy;
pub mod params;

use std::sync::{Arc, OnceLock};

use volt_evm::{NativeContract, Vm};
use volt_primitives::Address;

pub use authority::Authority;
pub use energy::Energy;
pub use params::Params;

/// Address of the authority contract
pub const AUTHORITY: Address = Address::from_name(b"Authority");

/// Address of the params contract
pub const PARAMS: Address = Address::from_name(b"Params");

/// Address of the energy contract
pub const ENERGY: Address = Address::from_name(b"Energy");

/// Gas charged by native methods that read state
pub const READ_GAS: u64 = 200;

/// Gas charged by native methods that write state
pub const WRITE_GAS: u64 = 5000;

type Natives = [(Address, Arc<dyn NativeContract>); 3];

/// Contract instances shared by every VM; method tables are hashed once
fn natives() -> &'static Natives {
    static NATIVES: OnceLock<Natives> = OnceLock::new();
    NATIVES.get_or_init(|| {
        [
            (AUTHORITY, Arc::new(Authority::new()) as Arc<dyn NativeContract>),
            (PARAMS, Arc::new(Params::new())),
            (ENERGY, Arc::new(Energy::new())),
        ]
    })
}

/// Register the authority, params and energy contracts on `vm`
pub fn hook_all(vm: &mut Vm<'_>) {
    for (address, native) in natives() {
        vm.hook_contract(*address, Arc::clone(native));
    }
}

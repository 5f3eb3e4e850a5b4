//! # volt-runtime
//!
//! Transaction execution for Volt.
//!
//! This crate ties the engine together:
//! - [`Runtime`] validates a transaction, prepays its gas with energy, runs
//!   its clauses and settles the unused gas
//! - [`common_to`] finds the recipient used as the sponsorship hint
//! - [`GenesisConfig`] seeds a world state from JSON

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
pub mod genesis;
mod runtime;

pub use error::{RuntimeError, RuntimeResult};
pub use genesis::{GenesisAccount, GenesisConfig, GenesisError};
pub use runtime::{common_to, BlockEnvironment, Runtime, RuntimeConfig};

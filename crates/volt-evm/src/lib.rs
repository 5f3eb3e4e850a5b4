//! # volt-evm
//!
//! Byte-code VM for clause execution.
//!
//! This crate provides:
//! - EVM interpreter with legacy gas rules
//! - Nested call and create frames backed by state checkpoints
//! - Native contract hooks at fixed addresses
//! - Deterministic contract addresses derived from the transaction id

#![warn(missing_docs)]
#![warn(clippy::all)]

mod arith;
mod context;
mod error;
pub mod gas;
mod interpreter;
mod memory;
mod opcode;
mod stack;
mod vm;

pub use context::{Context, GetHashFn};
pub use error::{VmError, VmResult};
pub use opcode::Opcode;
pub use vm::{contract_address, NativeCall, NativeContract, Output, Vm, VmConfig};

//! # volt-types
//!
//! Core transaction types for Volt.
//!
//! This crate provides:
//! - [`Transaction`] - Multi-clause signed transactions and their builder
//! - [`Clause`] - One call, transfer or contract creation
//! - [`Receipt`] - Transaction execution receipts
//! - [`intrinsic_gas`] - Base gas charged before execution

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
pub mod gas;
pub mod receipt;
pub mod transaction;

pub use error::{Result, TxError};
pub use gas::intrinsic_gas;
pub use receipt::{Log, Output, Receipt};
pub use transaction::{Clause, Transaction, TransactionBuilder};

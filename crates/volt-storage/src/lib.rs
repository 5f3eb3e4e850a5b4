//! # volt-storage
//!
//! World state for Volt.
//!
//! This crate provides:
//! - [`Account`] with energy that grows with the balance over time
//! - [`Backend`] persistence trait, with [`MemoryBackend`] and the RocksDB-backed [`StateDb`]
//! - [`State`], a layered write buffer with nested checkpoints and O(1) rollback

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod backend;
pub mod db;
mod error;
mod memory;
mod state;
mod state_db;

pub use account::{Account, EMPTY_CODE_HASH, ENERGY_GROWTH_RATE};
pub use backend::{Backend, ChangeSet};
pub use db::{Database, DbConfig};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use state::{Checkpoint, State};
pub use state_db::StateDb;

//! Intrinsic gas
//!
//! The base cost of a transaction, charged before any clause runs.

use crate::transaction::Clause;
use crate::{Result, TxError};

/// Base cost of every transaction
pub const TX_GAS: u64 = 5_000;
/// Cost of a clause with a recipient
pub const CLAUSE_GAS: u64 = 16_000;
/// Cost of a contract-creation clause
pub const CLAUSE_GAS_CONTRACT_CREATION: u64 = 48_000;
/// Cost of each zero payload byte
pub const TX_DATA_ZERO_GAS: u64 = 4;
/// Cost of each non-zero payload byte
pub const TX_DATA_NON_ZERO_GAS: u64 = 68;

/// Intrinsic gas of a clause list.
///
/// A transaction without clauses is charged as if it held one plain clause.
pub fn intrinsic_gas(clauses: &[Clause]) -> Result<u64> {
    if clauses.is_empty() {
        return Ok(TX_GAS + CLAUSE_GAS);
    }

    clauses.iter().try_fold(TX_GAS, |total, clause| {
        let clause_gas = if clause.is_creation() {
            CLAUSE_GAS_CONTRACT_CREATION
        } else {
            CLAUSE_GAS
        };
        data_gas(&clause.data)?
            .checked_add(clause_gas)
            .and_then(|gas| total.checked_add(gas))
            .ok_or(TxError::IntrinsicGasOverflow)
    })
}

fn data_gas(data: &[u8]) -> Result<u64> {
    let zeros = data.iter().filter(|b| **b == 0).count() as u64;
    let non_zeros = data.len() as u64 - zeros;

    zeros
        .checked_mul(TX_DATA_ZERO_GAS)
        .zip(non_zeros.checked_mul(TX_DATA_NON_ZERO_GAS))
        .and_then(|(z, nz)| z.checked_add(nz))
        .ok_or(TxError::IntrinsicGasOverflow)
}

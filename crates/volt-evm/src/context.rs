//! Execution context

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use volt_primitives::{Address, H256, U256};

/// Block-number to block-id lookup used by `BLOCKHASH`
pub type GetHashFn = Arc<dyn Fn(u32) -> H256 + Send + Sync>;

/// Everything a clause execution can observe about its block and transaction
#[derive(Clone)]
pub struct Context {
    /// Block beneficiary, returned by `COINBASE`
    pub beneficiary: Address,
    /// Block number
    pub number: u32,
    /// Block timestamp
    pub time: u64,
    /// Block gas limit
    pub gas_limit: u64,
    /// Transaction origin
    pub origin: Address,
    /// Transaction gas price
    pub gas_price: U256,
    /// Transaction id, seeds contract addresses
    pub tx_id: H256,
    /// Position of the clause within its transaction
    pub clause_index: u32,
    /// Historical block id lookup
    pub get_hash: GetHashFn,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            beneficiary: Address::ZERO,
            number: 0,
            time: 0,
            gas_limit: 0,
            origin: Address::ZERO,
            gas_price: U256::zero(),
            tx_id: H256::ZERO,
            clause_index: 0,
            get_hash: Arc::new(|_| H256::ZERO),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("beneficiary", &self.beneficiary)
            .field("number", &self.number)
            .field("time", &self.time)
            .field("gas_limit", &self.gas_limit)
            .field("origin", &self.origin)
            .field("gas_price", &self.gas_price)
            .field("tx_id", &self.tx_id)
            .field("clause_index", &self.clause_index)
            .finish_non_exhaustive()
    }
}

/// One call frame
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    /// Account whose storage and balance the code acts on
    pub address: Address,
    /// Account the executed code was loaded from
    pub code_address: Address,
    /// Caller address
    pub caller: Address,
    /// Value passed with the call
    pub value: U256,
    /// Call data
    pub input: Bytes,
    /// No state modifications allowed
    pub is_static: bool,
    /// Nesting depth, 0 for the clause itself
    pub depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_hashes_to_zero() {
        let ctx = Context::default();
        assert_eq!((ctx.get_hash)(42), H256::ZERO);
        assert_eq!(ctx.gas_price, U256::zero());
    }

    #[test]
    fn test_debug_skips_lookup() {
        let ctx = Context {
            number: 7,
            ..Default::default()
        };
        let out = format!("{ctx:?}");
        assert!(out.contains("number: 7"));
        assert!(!out.contains("get_hash"));
    }
}

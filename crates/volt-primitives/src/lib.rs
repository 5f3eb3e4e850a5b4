//! # volt-primitives
//!
//! Fixed-size byte types and the 256-bit integer shared by every Volt crate.
//!
//! - [`Address`]: 20-byte account identifier
//! - [`H256`]: 32-byte hash, storage key or log topic
//! - [`U256`]: value, gas price and energy amounts ([`U512`] for intermediate products)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{Hash, HashError, H256};

pub use primitive_types::{U256, U512};

/// Gas amount
pub type Gas = u64;

/// Block number
pub type BlockNumber = u32;

/// Convert a `U256` into its 32-byte big-endian word.
pub fn u256_to_h256(value: U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256::from_bytes(bytes)
}

/// Interpret a 32-byte word as a big-endian `U256`.
pub fn h256_to_u256(word: &H256) -> U256 {
    U256::from_big_endian(word.as_bytes())
}

/// Parse a decimal or `0x`-prefixed hex quantity. Empty input is zero.
pub fn parse_u256(s: &str) -> Result<U256, PrimitiveError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(U256::zero());
    }
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => U256::from_str_radix(digits, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(s).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| PrimitiveError::Quantity(format!("{s}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_conversion() {
        let value = U256::from(0xdead_beefu64);
        let word = u256_to_h256(value);
        assert_eq!(&word.as_bytes()[28..], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(h256_to_u256(&word), value);
    }

    #[test]
    fn test_parse_u256() {
        assert_eq!(parse_u256("1000").unwrap(), U256::from(1000));
        assert_eq!(parse_u256("0x3e8").unwrap(), U256::from(1000));
        assert_eq!(parse_u256("  ").unwrap(), U256::zero());
        assert!(parse_u256("12ab").is_err());
        assert!(parse_u256("0xzz").is_err());
    }

    #[test]
    fn test_word_conversion_max() {
        let word = u256_to_h256(U256::MAX);
        assert_eq!(word.as_bytes(), &[0xff; 32]);
    }
}

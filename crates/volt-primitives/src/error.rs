//! Errors raised while decoding primitive values

use crate::address::AddressError;
use crate::hash::HashError;
use thiserror::Error;

/// Any failure decoding an address, hash or quantity
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// Malformed address
    #[error("bad address: {0}")]
    Address(#[from] AddressError),

    /// Malformed 32-byte word
    #[error("bad word: {0}")]
    Hash(#[from] HashError),

    /// Integer quantity could not be parsed
    #[error("invalid quantity: {0}")]
    Quantity(String),
}

//! # volt-api
//!
//! JSON presentation for Volt.
//!
//! - [`ReceiptJson`] projects a receipt field for field, with hex quantities
//! - [`TransactionRequest`] describes a transaction to sign and execute

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
pub mod request;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use request::{ClauseRequest, TransactionRequest};
pub use types::{format_bytes, format_u256, format_u64, parse_hex_bytes, LogJson, OutputJson, ReceiptJson};

//! API error types

use thiserror::Error;
use volt_types::TxError;

/// Errors turning JSON into engine types
#[derive(Debug, Error)]
pub enum ApiError {
    /// A field held a value that could not be parsed
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// JSON field name
        field: &'static str,
        /// Parser message
        reason: String,
    },

    /// Transaction could not be built or signed
    #[error("transaction error: {0}")]
    Transaction(#[from] TxError),

    /// JSON error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Invalid field helper
    pub fn invalid(field: &'static str, reason: impl ToString) -> Self {
        ApiError::InvalidField {
            field,
            reason: reason.to_string(),
        }
    }
}

/// Result type for API conversions
pub type ApiResult<T> = Result<T, ApiError>;

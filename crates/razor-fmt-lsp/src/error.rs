//! Errors surfaced to the LSP client.

use razor_fmt::FormatError;
use thiserror::Error;

/// A formatting request that could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request parameters are malformed.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The request violated the formatter's contract.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The request was cancelled.
    #[error("request cancelled")]
    Cancelled,
}

impl ServiceError {
    /// JSON-RPC error code for the response.
    pub fn code(&self) -> i64 {
        match self {
            ServiceError::InvalidParams(_) | ServiceError::Format(_) => -32602,
            ServiceError::Cancelled => -32800,
        }
    }
}

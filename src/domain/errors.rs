//! Domain-specific error types

use thiserror::Error;

/// Domain-level errors for market data and user identity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid timeframe: {value}. Valid values: 1h, 4h, 1d, 1w")]
    InvalidTimeframe { value: String },

    #[error("Unsupported auth provider: {value}")]
    InvalidProvider { value: String },

    #[error("{field}: {message}")]
    InvalidInput { field: String, message: String },
}

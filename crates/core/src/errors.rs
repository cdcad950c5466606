//! Error types

use thiserror::Error;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors talking to the exchange backend
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend answered with an `Err` variant
    #[error("Backend rejected request: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed reply: {0}")]
    Decode(String),
}

/// Swap flow errors
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Invalid tokens provided for swap quote")]
    InvalidTokens,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("No status reported for request {0}")]
    UnknownRequest(u64),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
pub type BackendResult<T> = Result<T, BackendError>;
pub type SwapResult<T> = Result<T, SwapError>;

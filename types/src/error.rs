//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while parsing or validating primitive values.
#[derive(Debug, Error)]
pub enum TesseraError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid chain id: {0}")]
    InvalidChainId(u64),

    #[error("{0}")]
    Other(String),
}

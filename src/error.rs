//! Error types for Safe deployment encoding and address search.

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Input parsing
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid salt nonce: {0}")]
    InvalidNonce(String),

    // Safe setup
    #[error("Invalid Safe setup: {0}")]
    InvalidSetup(String),

    // ABI decoding
    #[error("Unexpected selector: expected 0x{expected}, got 0x{actual}")]
    SelectorMismatch { expected: String, actual: String },

    #[error("Calldata truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Malformed calldata: {0}")]
    Malformed(String),

    #[error("ABI decoding failed: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

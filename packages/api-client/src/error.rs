//! Error types for the DacSan API client.

use thiserror::Error;

/// Result type for API client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// API client errors.
///
/// These surface only from client construction and request assembly. Failed
/// requests themselves come back as failure envelopes, never as `Err` — see
/// the crate docs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuration error (bad base URL, client construction failed)
    #[error("Configuration error: {0}")]
    Config(String),
}

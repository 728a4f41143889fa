//! Relay error taxonomy.
//!
//! Every failure a request can hit maps onto one of these kinds; the HTTP
//! layer turns them into status codes without exposing internal detail.

use camrelay_crypto::CryptoError;

/// Errors surfaced by relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// PIN absent or mismatched.
    #[error("{0}")]
    Unauthorized(String),

    /// Unknown key version, no frame, and similar lookups.
    #[error("{0}")]
    NotFound(String),

    /// A command was submitted before any key was registered.
    #[error("No encryption key registered")]
    NoKeyRegistered,

    /// The inbound payload could not be turned back into a frame.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Request body exceeded the configured payload limit.
    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("PIN storage error: {0}")]
    PinStorage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Config(#[from] camrelay_core::Error),
}

//! Error types for the signature layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
///
/// Signature verification never produces an error: a bad signature is
/// reported as `false` by [`crate::verify`].
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key pair generation failed (e.g. no secure randomness available).
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A public key could not be decoded.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A public key could not be encoded.
    #[error("public key encoding failed: {0}")]
    Encoding(String),
}

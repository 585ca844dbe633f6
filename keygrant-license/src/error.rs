//! Error types for the licensing client.

use keygrant_crypto::CryptoError;
use thiserror::Error;

/// Licensing client errors.
///
/// The messages of the terminal protocol failures are stable strings that
/// embedding applications show to users.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The server could not be reached, or replied with something that is
    /// not a valid response body.
    #[error("Could not contact server: {0}")]
    Network(String),

    /// The server answered with an explicit error result.
    #[error("An error occurred in the method: {0}")]
    Server(String),

    /// The user did not approve the authorization request in time.
    #[error("Timeout reached. The user took too long time to authorize this request.")]
    Timeout,

    /// The caller cancelled the authorization wait.
    #[error("authorization cancelled")]
    Cancelled,

    /// The signed license payload did not verify against the pinned key.
    #[error("Verification of the signature failed.")]
    InvalidSignature,

    /// The signed payload restricts machines and this one is not listed.
    #[error("This machine code has not been authorized.")]
    MachineNotAuthorized,

    /// The payload signature is older (or further in the future) than allowed.
    #[error("signed payload is stale: signature age {age_secs}s, limit {max_age_secs}s")]
    StaleSignature { age_secs: i64, max_age_secs: u64 },

    /// The long-lived access token could not be decoded.
    #[error("invalid access token: {0}")]
    InvalidAccessToken(String),

    /// The verified payload could not be decoded.
    #[error("invalid license payload: {0}")]
    InvalidPayload(String),

    /// No launcher could open the authorization URL.
    #[error("could not open browser: {0}")]
    Launch(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Key generation or signing failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for licensing operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

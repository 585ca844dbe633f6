//! Access and session tokens.
//!
//! The long-lived [`AccessToken`] is issued to the application by the
//! licensing service. Its body is base64 of a JSON array whose first
//! element is the numeric token id, which scopes authorization requests.
//!
//! The short-lived [`SessionToken`] is what the handshake produces.

use crate::error::{LicenseError, LicenseResult};
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The long-lived token the application authenticates with.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the numeric token id from the token body.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidAccessToken`] if the body is not
    /// base64, not a JSON array, or its first element is not an integer
    /// (or a string holding one).
    pub fn token_id(&self) -> LicenseResult<i64> {
        let bytes = decode_lenient(&self.0).ok_or_else(|| {
            LicenseError::InvalidAccessToken("token is not valid base64".to_string())
        })?;

        let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
            LicenseError::InvalidAccessToken(format!("token body is not JSON: {e}"))
        })?;

        let first = value
            .as_array()
            .and_then(|items| items.first())
            .ok_or_else(|| {
                LicenseError::InvalidAccessToken("token body is not a non-empty array".to_string())
            })?;

        first
            .as_i64()
            .or_else(|| first.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| {
                LicenseError::InvalidAccessToken(format!("token id is not numeric: {first}"))
            })
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

fn decode_lenient(input: &str) -> Option<Vec<u8>> {
    [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD]
        .into_iter()
        .find_map(|engine| engine.decode(input).ok())
}

/// A scope-limited bearer credential issued after a successful handshake.
///
/// Reuse it with `LicenseClient::fetch_licenses` to avoid repeating the
/// handshake while it is still valid.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

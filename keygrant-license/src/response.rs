//! Response bodies returned by the licensing API.

use crate::error::{LicenseError, LicenseResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

/// Outcome flag carried by every response.
///
/// Accepts both the names (`"Success"`, `"Error"`) and the numeric codes
/// (`0`, `1`) the API may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawResultCode")]
pub enum ResultCode {
    Success,
    Error,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResultCode {
    Code(i64),
    Name(String),
}

impl TryFrom<RawResultCode> for ResultCode {
    type Error = String;

    fn try_from(raw: RawResultCode) -> Result<Self, String> {
        match raw {
            RawResultCode::Code(0) => Ok(ResultCode::Success),
            RawResultCode::Code(1) => Ok(ResultCode::Error),
            RawResultCode::Name(name) if name.eq_ignore_ascii_case("success") => {
                Ok(ResultCode::Success)
            }
            RawResultCode::Name(name) if name.eq_ignore_ascii_case("error") => {
                Ok(ResultCode::Error)
            }
            RawResultCode::Code(code) => Err(format!("unknown result code {code}")),
            RawResultCode::Name(name) => Err(format!("unknown result {name:?}")),
        }
    }
}

/// Common envelope of every API response.
pub trait ApiResponse: Sized {
    fn result(&self) -> ResultCode;

    fn message(&self) -> Option<&str>;

    /// Converts an error result into [`LicenseError::Server`].
    fn into_success(self) -> LicenseResult<Self> {
        match self.result() {
            ResultCode::Success => Ok(self),
            ResultCode::Error => Err(LicenseError::Server(
                self.message().unwrap_or("unknown error").to_string(),
            )),
        }
    }
}

macro_rules! impl_api_response {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ApiResponse for $ty {
                fn result(&self) -> ResultCode {
                    self.result
                }

                fn message(&self) -> Option<&str> {
                    self.message.as_deref()
                }
            }
        )+
    };
}

/// Reply to [`crate::request::ChallengeRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChallengeResponse {
    pub result: ResultCode,
    #[serde(default)]
    pub message: Option<String>,
    /// Base64 challenge bytes.
    #[serde(default)]
    pub challenge: Option<String>,
}

impl ChallengeResponse {
    /// Decodes the challenge bytes.
    pub fn challenge_bytes(&self) -> LicenseResult<Vec<u8>> {
        let encoded = self
            .challenge
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LicenseError::Network("response has no challenge".to_string()))?;
        BASE64
            .decode(encoded)
            .map_err(|e| LicenseError::Network(format!("challenge is not valid base64: {e}")))
    }
}

/// Reply to [`crate::request::ExchangeTokenRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExchangeTokenResponse {
    pub result: ResultCode,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Reply to [`crate::request::LicenseKeysRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LicenseKeysResponse {
    pub result: ResultCode,
    #[serde(default)]
    pub message: Option<String>,
    /// Base64 of the JSON license array.
    #[serde(default)]
    pub results: Option<String>,
    /// Base64 of the JSON array of machine codes the licenses are bound to.
    #[serde(default)]
    pub activated_machine_codes: Option<String>,
    /// Base64 PKCS#1 v1.5 SHA-256 signature.
    #[serde(default)]
    pub signature: Option<String>,
    /// Unix seconds included in the signed bytes.
    #[serde(default)]
    pub sign_date: Option<i64>,
}

impl_api_response!(ChallengeResponse, ExchangeTokenResponse, LicenseKeysResponse);

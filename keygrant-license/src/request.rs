//! Request types and their explicit field mappings.
//!
//! Every request sent to the licensing API implements [`FormRequest`],
//! which names its endpoint and lists its form fields. The bearer `token`
//! field is appended by the transport helpers, never by the request.

use crate::config::HandshakeConfig;
use crate::error::LicenseResult;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use keygrant_crypto::{random_bytes, PublicKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Number of random bytes in an authorization token.
pub const AUTHORIZATION_TOKEN_BYTES: usize = 30;

/// API endpoint paths, relative to the configured base URL.
pub mod endpoints {
    /// Issues a fresh challenge for a pending authorization request.
    pub const ISSUE_CHALLENGE: &str = "/userauth/issuechallenge";
    /// Exchanges a signed challenge for a session token.
    pub const EXCHANGE_TOKEN: &str = "/userauth/exchangetoken";
    /// Returns the signed license list of the authorizing user.
    pub const GET_LICENSE_KEYS: &str = "/userauth/getlicensekeys";
}

/// A request with a statically declared endpoint and field set.
pub trait FormRequest {
    /// Endpoint path the request is posted to.
    const ENDPOINT: &'static str;

    /// Form fields, in send order.
    fn form_fields(&self) -> Vec<(&'static str, String)>;
}

/// A capability a session token may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// List the user's license keys.
    GetLicenseKeys,
    /// Activate a license on a machine.
    Activate,
    /// Deactivate a license on a machine.
    Deactivate,
    /// Read customer details attached to licenses.
    GetCustomerInfo,
}

impl Capability {
    /// Every capability, in query order.
    pub const ALL: [Capability; 4] = [
        Self::GetLicenseKeys,
        Self::Activate,
        Self::Deactivate,
        Self::GetCustomerInfo,
    ];

    /// Field name used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetLicenseKeys => "GetLicenseKeys",
            Self::Activate => "Activate",
            Self::Deactivate => "Deactivate",
            Self::GetCustomerInfo => "GetCustomerInfo",
        }
    }
}

/// The set of capabilities requested for a session token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    capabilities: BTreeSet<Capability>,
}

impl Scope {
    /// An empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope that only allows listing license keys.
    #[must_use]
    pub fn license_keys() -> Self {
        Self::new().with(Capability::GetLicenseKeys)
    }

    /// Adds a capability.
    #[must_use]
    pub fn with(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Returns true if the capability is requested.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Each capability as a named boolean, in [`Capability::ALL`] order.
    pub fn flags(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        Capability::ALL
            .into_iter()
            .map(|c| (c.name(), self.allows(c)))
    }
}

/// A request for the user to approve a session token for this device.
///
/// Built once per handshake and never mutated. It travels to the server
/// inside the approval URL, not through the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    authorization_token: String,
    expires_minutes: u32,
    public_key: String,
    scope: Scope,
    app_name: String,
    device_name: String,
    machine_code: String,
    token_id: i64,
}

impl AuthorizationRequest {
    /// Creates a request with a fresh random authorization token.
    pub fn new(
        public_key: &PublicKey,
        config: &HandshakeConfig,
        device_name: &str,
        machine_code: &str,
        token_id: i64,
    ) -> LicenseResult<Self> {
        let authorization_token = BASE64.encode(random_bytes(AUTHORIZATION_TOKEN_BYTES)?);
        Ok(Self {
            authorization_token,
            expires_minutes: config.expires_minutes,
            public_key: public_key.to_base64()?,
            scope: config.scope.clone(),
            app_name: config.app_name.clone(),
            device_name: device_name.to_string(),
            machine_code: machine_code.to_string(),
            token_id,
        })
    }

    /// The random token correlating polling calls with this request.
    #[must_use]
    pub fn authorization_token(&self) -> &str {
        &self.authorization_token
    }

    #[must_use]
    pub fn expires_minutes(&self) -> u32 {
        self.expires_minutes
    }

    /// Base64 PKCS#1 DER of the handshake public key.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    #[must_use]
    pub fn machine_code(&self) -> &str {
        &self.machine_code
    }

    #[must_use]
    pub fn token_id(&self) -> i64 {
        self.token_id
    }

    /// Query-string fields of the approval URL.
    pub fn query_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("AuthorizationToken", self.authorization_token.clone()),
            ("Expires", self.expires_minutes.to_string()),
            ("PublicKey", self.public_key.clone()),
            ("AppName", self.app_name.clone()),
            ("DeviceName", self.device_name.clone()),
            ("MachineCode", self.machine_code.clone()),
            ("TokenId", self.token_id.to_string()),
        ];
        fields.extend(self.scope.flags().map(|(name, on)| (name, on.to_string())));
        fields
    }

    /// Builds the approval URL under `auth_base_url`.
    #[must_use]
    pub fn authorization_url(&self, auth_base_url: &str) -> String {
        let query = self
            .query_fields()
            .into_iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(&v)))
            .collect::<Vec<_>>()
            .join("&");
        let separator = if auth_base_url.contains('?') { '&' } else { '?' };
        format!("{auth_base_url}{separator}{query}")
    }
}

/// Asks for a fresh challenge for a pending authorization.
#[derive(Debug, Clone)]
pub struct ChallengeRequest<'a> {
    pub authorization_token: &'a str,
}

impl FormRequest for ChallengeRequest<'_> {
    const ENDPOINT: &'static str = endpoints::ISSUE_CHALLENGE;

    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![("AuthorizationToken", self.authorization_token.to_string())]
    }
}

/// Proves possession of the handshake key by returning a signed challenge.
#[derive(Debug, Clone)]
pub struct ExchangeTokenRequest<'a> {
    pub authorization_token: &'a str,
    /// Base64 signature over `challenge ‖ le64(date)`.
    pub signature: String,
    /// Unix seconds included in the signed bytes.
    pub date: i64,
}

impl FormRequest for ExchangeTokenRequest<'_> {
    const ENDPOINT: &'static str = endpoints::EXCHANGE_TOKEN;

    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("AuthorizationToken", self.authorization_token.to_string()),
            ("Signature", self.signature.clone()),
            ("Date", self.date.to_string()),
        ]
    }
}

/// Fetches the license list of the authorizing user.
#[derive(Debug, Clone)]
pub struct LicenseKeysRequest {
    /// Ask the server to sign the response.
    pub sign: bool,
}

impl Default for LicenseKeysRequest {
    fn default() -> Self {
        Self { sign: true }
    }
}

impl FormRequest for LicenseKeysRequest {
    const ENDPOINT: &'static str = endpoints::GET_LICENSE_KEYS;

    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![("Sign", self.sign.to_string())]
    }
}

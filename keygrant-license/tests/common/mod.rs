//! Shared test helpers for licensing tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use keygrant_crypto::{signing_message, HashAlg, KeyPair};
use keygrant_license::{
    AccessToken, HandshakeConfig, LicenseError, LicensePayload, LicenseResult, Transport,
    UrlLauncher,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, OnceLock};

/// Challenge bytes handed out by scripted servers.
pub const CHALLENGE: [u8; 5] = [0x01, 0x02, 0x03, 0x04, 0x05];

/// Returns the handshake key pair shared by every test in the binary.
pub fn handshake_keypair() -> &'static KeyPair {
    static KEYPAIR: OnceLock<KeyPair> = OnceLock::new();
    KEYPAIR.get_or_init(|| KeyPair::generate_with_bits(1024).unwrap())
}

/// Returns the key pair standing in for the server's payload signing key.
pub fn server_keypair() -> &'static KeyPair {
    static KEYPAIR: OnceLock<KeyPair> = OnceLock::new();
    KEYPAIR.get_or_init(|| KeyPair::generate_with_bits(1024).unwrap())
}

/// Builds an access token whose body is `[id, "secret"]`.
pub fn access_token(id: i64) -> AccessToken {
    let body = json!([id, "secret"]).to_string();
    AccessToken::new(BASE64.encode(body))
}

/// A handshake config that needs no hostname lookup.
pub fn handshake_config() -> HandshakeConfig {
    HandshakeConfig {
        auth_base_url: "https://licensing.test/authorize".to_string(),
        app_name: "Test App".to_string(),
        device_name: Some("test-device".to_string()),
        ..Default::default()
    }
}

pub fn body(value: Value) -> LicenseResult<Vec<u8>> {
    Ok(value.to_string().into_bytes())
}

pub fn challenge_success() -> Value {
    json!({ "Result": "Success", "Message": "", "Challenge": BASE64.encode(CHALLENGE) })
}

pub fn error_result(message: &str) -> Value {
    json!({ "Result": "Error", "Message": message })
}

pub fn token_success(token: &str) -> Value {
    json!({ "Result": "Success", "Token": token })
}

/// Encodes `payload` the way the license list endpoint does: licenses and
/// machine codes as separate base64 JSON fields, signed with the server key.
pub fn signed_license_response(payload: &LicensePayload, sign_date: i64) -> Value {
    let results = serde_json::to_vec(&payload.licenses).unwrap();
    let machine_codes = serde_json::to_vec(&payload.activated_machine_codes).unwrap();
    signed_raw_response(&results, Some(machine_codes.as_slice()), sign_date)
}

/// Signs `results ‖ machine_codes ‖ le64(sign_date)`. With no machine codes
/// the `ActivatedMachineCodes` field is left out.
pub fn signed_raw_response(results: &[u8], machine_codes: Option<&[u8]>, sign_date: i64) -> Value {
    let data = [results, machine_codes.unwrap_or_default()].concat();
    let message = signing_message(&data, sign_date);
    let signature = server_keypair().sign(&message, HashAlg::Sha256).unwrap();

    let mut response = json!({
        "Result": "Success",
        "Results": BASE64.encode(results),
        "Signature": BASE64.encode(signature),
        "SignDate": sign_date,
    });
    if let Some(codes) = machine_codes {
        response["ActivatedMachineCodes"] = json!(BASE64.encode(codes));
    }
    response
}

/// One request seen by a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: String,
    pub form: Vec<(&'static str, String)>,
}

impl Call {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

type Handler = dyn Fn(&Call) -> LicenseResult<Vec<u8>> + Send + Sync;

/// In-memory transport answering from a closure and recording every call.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&Call) -> LicenseResult<Vec<u8>> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A transport where every request fails as if the network were down.
    pub fn unreachable() -> Self {
        Self::new(|_| Err(LicenseError::Network("connection refused".to_string())))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_form(
        &self,
        endpoint: &str,
        form: Vec<(&'static str, String)>,
    ) -> LicenseResult<Vec<u8>> {
        let call = Call {
            endpoint: endpoint.to_string(),
            form,
        };
        self.calls.lock().unwrap().push(call.clone());
        (self.handler)(&call)
    }
}

/// Launcher that records URLs instead of opening a browser.
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    pub urls: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl UrlLauncher for RecordingLauncher {
    fn launch(&self, url: &str) -> LicenseResult<()> {
        self.urls.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(LicenseError::Launch("no browser".to_string()));
        }
        Ok(())
    }
}

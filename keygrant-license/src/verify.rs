//! Fetching and verifying the signed license list.
//!
//! The server returns the license array and the machine-code array as two
//! base64 JSON fields and signs `results ‖ machine_codes ‖ le64(sign_date)`
//! with SHA-256 PKCS#1 v1.5 using the key the application pins. Nothing in
//! either field is read until that signature verifies; afterwards the
//! machine list decides whether this machine may use the licenses.

use crate::config::VerifyConfig;
use crate::device::MachineCode;
use crate::error::{LicenseError, LicenseResult};
use crate::license::{LicensePayload, LicenseRecord};
use crate::request::LicenseKeysRequest;
use crate::response::{ApiResponse, LicenseKeysResponse};
use crate::token::SessionToken;
use crate::transport::{try_send, Transport};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use keygrant_crypto::{signing_message, verify, HashAlg, PublicKey};
use tracing::{debug, warn};

/// The signed parts of a license list response, not yet trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLicensePayload {
    results: Vec<u8>,
    machine_codes: Vec<u8>,
    signature: Vec<u8>,
    sign_date: i64,
}

impl SignedLicensePayload {
    /// `machine_codes` is empty when the server sent no machine list.
    #[must_use]
    pub fn new(
        results: Vec<u8>,
        machine_codes: Vec<u8>,
        signature: Vec<u8>,
        sign_date: i64,
    ) -> Self {
        Self {
            results,
            machine_codes,
            signature,
            sign_date,
        }
    }

    /// Extracts the signed parts of a license list response.
    ///
    /// A response missing `Results`, `Signature` or `SignDate`, or with
    /// undecodable base64, cannot be verified and is rejected as
    /// [`LicenseError::InvalidSignature`]. A missing `ActivatedMachineCodes`
    /// contributes no bytes to the signed message.
    pub fn from_response(response: &LicenseKeysResponse) -> LicenseResult<Self> {
        let decode = |field: Option<&str>, name: &str| -> LicenseResult<Vec<u8>> {
            let encoded = field.ok_or_else(|| {
                debug!(field = name, "signed response is missing a field");
                LicenseError::InvalidSignature
            })?;
            BASE64.decode(encoded).map_err(|e| {
                debug!(field = name, error = %e, "signed response field is not base64");
                LicenseError::InvalidSignature
            })
        };

        let results = decode(response.results.as_deref(), "Results")?;
        let machine_codes = match response.activated_machine_codes.as_deref() {
            Some(encoded) => decode(Some(encoded), "ActivatedMachineCodes")?,
            None => Vec::new(),
        };
        let signature = decode(response.signature.as_deref(), "Signature")?;
        let sign_date = response.sign_date.ok_or(LicenseError::InvalidSignature)?;

        Ok(Self::new(results, machine_codes, signature, sign_date))
    }

    /// Unix seconds the server signed at.
    #[must_use]
    pub fn sign_date(&self) -> i64 {
        self.sign_date
    }

    /// `results ‖ machine_codes`, the data the timestamp is appended to.
    #[must_use]
    pub fn signed_data(&self) -> Vec<u8> {
        [self.results.as_slice(), self.machine_codes.as_slice()].concat()
    }

    /// Checks the signature against `pinned_key`.
    #[must_use]
    pub fn verify(&self, pinned_key: &PublicKey) -> bool {
        let message = signing_message(&self.signed_data(), self.sign_date);
        verify(pinned_key, &message, &self.signature, HashAlg::Sha256)
    }
}

/// Verifies `signed` and returns its decoded licenses and machine list.
///
/// Checks, in order: the signature, the optional freshness limit, the
/// payload encoding, and machine authorization.
pub fn verify_payload(
    signed: &SignedLicensePayload,
    pinned_key: &PublicKey,
    machine_code: &MachineCode,
    config: &VerifyConfig,
) -> LicenseResult<LicensePayload> {
    verify_payload_at(signed, pinned_key, machine_code, config, Utc::now())
}

pub(crate) fn verify_payload_at(
    signed: &SignedLicensePayload,
    pinned_key: &PublicKey,
    machine_code: &MachineCode,
    config: &VerifyConfig,
    now: DateTime<Utc>,
) -> LicenseResult<LicensePayload> {
    if !signed.verify(pinned_key) {
        warn!("license payload signature did not verify; discarding payload");
        return Err(LicenseError::InvalidSignature);
    }

    if let Some(max_age_secs) = config.max_signature_age_secs {
        let age_secs = now.timestamp() - signed.sign_date;
        if age_secs.unsigned_abs() > max_age_secs {
            return Err(LicenseError::StaleSignature {
                age_secs,
                max_age_secs,
            });
        }
    }

    let licenses: Vec<LicenseRecord> = serde_json::from_slice(&signed.results)
        .map_err(|e| LicenseError::InvalidPayload(format!("Results: {e}")))?;
    let activated_machine_codes: Vec<String> = if signed.machine_codes.is_empty() {
        Vec::new()
    } else {
        serde_json::from_slice(&signed.machine_codes)
            .map_err(|e| LicenseError::InvalidPayload(format!("ActivatedMachineCodes: {e}")))?
    };

    let payload = LicensePayload {
        licenses,
        activated_machine_codes,
    };
    if !payload.authorizes(machine_code.as_str()) {
        return Err(LicenseError::MachineNotAuthorized);
    }

    Ok(payload)
}

/// Verified license records and the session token that fetched them.
#[derive(Debug, Clone)]
pub struct VerifiedLicenses {
    pub licenses: Vec<LicenseRecord>,
    /// Machines the payload is restricted to; empty means any.
    pub activated_machine_codes: Vec<String>,
    /// When the server signed the payload.
    pub signed_at: Option<DateTime<Utc>>,
    /// Reusable for later calls while it remains valid.
    pub session_token: SessionToken,
}

/// Requests the signed license list and verifies it.
///
/// # Errors
///
/// - [`LicenseError::Network`] if the server cannot be reached
/// - [`LicenseError::Server`] if the server reports an error
/// - [`LicenseError::InvalidSignature`] if the signature does not verify
/// - [`LicenseError::MachineNotAuthorized`] if this machine is not listed
pub async fn fetch_licenses<T: Transport + ?Sized>(
    transport: &T,
    session_token: SessionToken,
    pinned_key: &PublicKey,
    machine_code: &MachineCode,
    config: &VerifyConfig,
) -> LicenseResult<VerifiedLicenses> {
    let response: LicenseKeysResponse =
        try_send(transport, &LicenseKeysRequest::default(), session_token.as_str()).await?;
    let response = response.into_success()?;

    let signed = SignedLicensePayload::from_response(&response)?;
    let payload = verify_payload(&signed, pinned_key, machine_code, config)?;
    debug!(count = payload.licenses.len(), "license list verified");

    Ok(VerifiedLicenses {
        licenses: payload.licenses,
        activated_machine_codes: payload.activated_machine_codes,
        signed_at: DateTime::from_timestamp(signed.sign_date, 0),
        session_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygrant_crypto::KeyPair;
    use std::sync::OnceLock;

    fn keypair() -> &'static KeyPair {
        static KEYPAIR: OnceLock<KeyPair> = OnceLock::new();
        KEYPAIR.get_or_init(|| KeyPair::generate_with_bits(1024).unwrap())
    }

    fn signed_at(sign_date: i64) -> SignedLicensePayload {
        let results = b"[]".to_vec();
        let message = signing_message(&results, sign_date);
        let signature = keypair().sign(&message, HashAlg::Sha256).unwrap();
        SignedLicensePayload::new(results, Vec::new(), signature, sign_date)
    }

    #[test]
    fn fresh_signature_within_limit() {
        let now = Utc::now();
        let signed = signed_at(now.timestamp() - 10);
        let config = VerifyConfig {
            max_signature_age_secs: Some(60),
        };
        let result = verify_payload_at(
            &signed,
            keypair().public_key(),
            &MachineCode::new("m1"),
            &config,
            now,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn stale_signature_rejected() {
        let now = Utc::now();
        let signed = signed_at(now.timestamp() - 600);
        let config = VerifyConfig {
            max_signature_age_secs: Some(60),
        };
        let result = verify_payload_at(
            &signed,
            keypair().public_key(),
            &MachineCode::new("m1"),
            &config,
            now,
        );
        assert!(matches!(
            result,
            Err(LicenseError::StaleSignature { age_secs: 600, max_age_secs: 60 })
        ));
    }

    #[test]
    fn future_signature_rejected() {
        let now = Utc::now();
        let signed = signed_at(now.timestamp() + 600);
        let config = VerifyConfig {
            max_signature_age_secs: Some(60),
        };
        let result = verify_payload_at(
            &signed,
            keypair().public_key(),
            &MachineCode::new("m1"),
            &config,
            now,
        );
        assert!(matches!(result, Err(LicenseError::StaleSignature { .. })));
    }

    #[test]
    fn age_unchecked_by_default() {
        let signed = signed_at(0);
        let result = verify_payload(
            &signed,
            keypair().public_key(),
            &MachineCode::new("m1"),
            &VerifyConfig::default(),
        );
        assert!(result.is_ok());
    }
}

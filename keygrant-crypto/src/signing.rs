//! PKCS#1 v1.5 signing and verification.
//!
//! Signed messages that carry a timestamp append it as 8 little-endian
//! bytes of Unix seconds. The encoding is fixed on the wire, independent
//! of host byte order, so both sides produce identical signed bytes.

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{KeyPair, PublicKey};
use rand::rngs::OsRng;
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256, Sha512};

/// Hash function used inside the PKCS#1 v1.5 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlg {
    /// SHA-256, used for server-signed license payloads.
    Sha256,
    /// SHA-512, used for handshake challenge responses.
    Sha512,
}

impl HashAlg {
    fn scheme_and_digest(self, message: &[u8]) -> (Pkcs1v15Sign, Vec<u8>) {
        match self {
            Self::Sha256 => (Pkcs1v15Sign::new::<Sha256>(), Sha256::digest(message).to_vec()),
            Self::Sha512 => (Pkcs1v15Sign::new::<Sha512>(), Sha512::digest(message).to_vec()),
        }
    }
}

/// Signs `message` with the private half of `key`.
pub fn sign(key: &KeyPair, message: &[u8], hash: HashAlg) -> CryptoResult<Vec<u8>> {
    let (scheme, digest) = hash.scheme_and_digest(message);
    key.private_key()
        .sign_with_rng(&mut OsRng, scheme, &digest)
        .map_err(|e| CryptoError::Signing(e.to_string()))
}

/// Verifies `signature` over `message`.
///
/// Returns `false` for any malformed, truncated or mismatched signature.
/// There is no error path: a caller can only ever learn "trusted" or
/// "untrusted".
#[must_use]
pub fn verify(key: &PublicKey, message: &[u8], signature: &[u8], hash: HashAlg) -> bool {
    let (scheme, digest) = hash.scheme_and_digest(message);
    key.as_rsa().verify(scheme, &digest, signature).is_ok()
}

/// Encodes Unix seconds as 8 little-endian bytes.
#[must_use]
pub fn timestamp_le_bytes(unix_secs: i64) -> [u8; 8] {
    unix_secs.to_le_bytes()
}

/// Builds `data ‖ le64(unix_secs)`, the byte string covered by both the
/// challenge response and the license payload signatures.
#[must_use]
pub fn signing_message(data: &[u8], unix_secs: i64) -> Vec<u8> {
    let mut message = Vec::with_capacity(data.len() + 8);
    message.extend_from_slice(data);
    message.extend_from_slice(&timestamp_le_bytes(unix_secs));
    message
}

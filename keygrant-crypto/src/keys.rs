//! RSA key pair generation and public key encodings.
//!
//! Two independent trust roots use these types:
//! - the ephemeral [`KeyPair`] created for each authorization handshake,
//!   whose public half is sent to the server;
//! - the pinned [`PublicKey`] the application ships with, used only to
//!   verify signed license payloads.

use crate::error::{CryptoError, CryptoResult};
use crate::signing::{self, HashAlg};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

/// Modulus size used for handshake key pairs.
pub const KEY_BITS: usize = 2048;

/// An RSA key pair held only in process memory.
///
/// The private key is zeroized when the pair is dropped.
#[derive(Clone)]
pub struct KeyPair {
    private: RsaPrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generates a fresh 2048-bit key pair.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyGeneration`] if the platform cannot supply
    /// secure randomness.
    pub fn generate() -> CryptoResult<Self> {
        Self::generate_with_bits(KEY_BITS)
    }

    /// Generates a fresh key pair with the given modulus size.
    pub fn generate_with_bits(bits: usize) -> CryptoResult<Self> {
        // OsRng panics inside keygen if the OS source is broken; check it first.
        let mut seed_check = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut seed_check)
            .map_err(|e| CryptoError::KeyGeneration(format!("secure randomness unavailable: {e}")))?;

        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_private_key(private))
    }

    /// Wraps an existing private key.
    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = PublicKey(private.to_public_key());
        Self { private, public }
    }

    /// Returns the public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Signs `message` with PKCS#1 v1.5 using the given hash.
    pub fn sign(&self, message: &[u8], hash: HashAlg) -> CryptoResult<Vec<u8>> {
        signing::sign(self, message, hash)
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// An RSA public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Parses a PEM key, accepting both `RSA PUBLIC KEY` (PKCS#1) and
    /// `PUBLIC KEY` (SPKI) armor.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let pem = pem.trim();
        RsaPublicKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPublicKey::from_public_key_pem(pem))
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Parses a DER key in PKCS#1 or SPKI form.
    pub fn from_der(der: &[u8]) -> CryptoResult<Self> {
        RsaPublicKey::from_pkcs1_der(der)
            .or_else(|_| RsaPublicKey::from_public_key_der(der))
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Builds a key from base64-encoded big-endian modulus and exponent.
    pub fn from_components(modulus_b64: &str, exponent_b64: &str) -> CryptoResult<Self> {
        let n = BASE64
            .decode(modulus_b64.trim())
            .map_err(|e| CryptoError::InvalidPublicKey(format!("invalid modulus base64: {e}")))?;
        let e = BASE64
            .decode(exponent_b64.trim())
            .map_err(|e| CryptoError::InvalidPublicKey(format!("invalid exponent base64: {e}")))?;

        RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Returns the PKCS#1 DER encoding.
    pub fn to_pkcs1_der(&self) -> CryptoResult<Vec<u8>> {
        self.0
            .to_pkcs1_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CryptoError::Encoding(e.to_string()))
    }

    /// Returns the base64 (standard alphabet) PKCS#1 DER encoding, the form
    /// sent to the server inside an authorization request.
    pub fn to_base64(&self) -> CryptoResult<String> {
        self.to_pkcs1_der().map(|der| BASE64.encode(der))
    }

    /// Returns the base64 big-endian `(modulus, exponent)` pair.
    pub fn to_components(&self) -> (String, String) {
        (
            BASE64.encode(self.0.n().to_bytes_be()),
            BASE64.encode(self.0.e().to_bytes_be()),
        )
    }

    /// Returns the modulus size in bits.
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Verifies a PKCS#1 v1.5 signature. See [`crate::verify`].
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &[u8], hash: HashAlg) -> bool {
        signing::verify(self, message, signature, hash)
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }
}

impl From<RsaPublicKey> for PublicKey {
    fn from(key: RsaPublicKey) -> Self {
        Self(key)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey").field("bits", &self.bits()).finish()
    }
}

/// Fills a buffer of `len` bytes from the OS random source.
pub fn random_bytes(len: usize) -> CryptoResult<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::KeyGeneration(format!("secure randomness unavailable: {e}")))?;
    Ok(bytes)
}

//! Signature primitives for keygrant.
//!
//! This crate provides:
//! - RSA key pair generation (2048-bit by default)
//! - PKCS#1 v1.5 signing and verification with SHA-256 or SHA-512
//! - The little-endian timestamp encoding shared by every signed message
//! - Public key decoding for pinned verification keys
//!
//! Everything here is stateless. Keys live only in memory.

mod error;
mod keys;
mod signing;

pub use error::{CryptoError, CryptoResult};
pub use keys::{random_bytes, KeyPair, PublicKey, KEY_BITS};
pub use signing::{sign, signing_message, timestamp_le_bytes, verify, HashAlg};

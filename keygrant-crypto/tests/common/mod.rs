//! Shared test helpers for signature tests.

#![allow(dead_code)]

use keygrant_crypto::KeyPair;
use std::sync::OnceLock;

/// Modulus size for test keys. Smaller than production keys so the suite
/// stays fast; still large enough for a SHA-512 PKCS#1 v1.5 signature.
pub const TEST_KEY_BITS: usize = 1024;

/// Returns a key pair shared by every test in the binary.
pub fn shared_keypair() -> &'static KeyPair {
    static KEYPAIR: OnceLock<KeyPair> = OnceLock::new();
    KEYPAIR.get_or_init(|| KeyPair::generate_with_bits(TEST_KEY_BITS).unwrap())
}

/// Returns a second, unrelated key pair.
pub fn other_keypair() -> &'static KeyPair {
    static KEYPAIR: OnceLock<KeyPair> = OnceLock::new();
    KEYPAIR.get_or_init(|| KeyPair::generate_with_bits(TEST_KEY_BITS).unwrap())
}

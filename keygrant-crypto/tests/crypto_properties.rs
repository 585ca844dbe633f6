//! Property-based tests for the signature primitives.
//!
//! These tests verify properties that must always hold:
//! - A signature over `payload ‖ le64(ts)` verifies with the signer's key
//! - Flipping any single bit of payload, timestamp or signature breaks it
//! - The timestamp encoding is a fixed little-endian layout

mod common;

use common::shared_keypair;
use keygrant_crypto::{sign, signing_message, timestamp_le_bytes, verify, HashAlg};
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..512)
}

fn hash_strategy() -> impl Strategy<Value = HashAlg> {
    prop_oneof![Just(HashAlg::Sha256), Just(HashAlg::Sha512)]
}

// RSA signing is expensive; keep case counts modest.
fn config() -> ProptestConfig {
    ProptestConfig::with_cases(24)
}

// =============================================================================
// SIGNATURE PROPERTIES
// =============================================================================

mod signature_properties {
    use super::*;

    proptest! {
        #![proptest_config(config())]

        /// A fresh signature always verifies
        #[test]
        fn sign_then_verify(
            payload in payload_strategy(),
            ts in any::<i64>(),
            hash in hash_strategy(),
        ) {
            let keypair = shared_keypair();
            let message = signing_message(&payload, ts);
            let signature = sign(keypair, &message, hash).unwrap();
            prop_assert!(verify(keypair.public_key(), &message, &signature, hash));
        }

        /// Flipping one payload bit breaks verification
        #[test]
        fn payload_bit_flip_fails(
            payload in payload_strategy(),
            ts in any::<i64>(),
            pos in any::<usize>(),
            bit in 0u8..8,
        ) {
            let keypair = shared_keypair();
            let signature = sign(keypair, &signing_message(&payload, ts), HashAlg::Sha256).unwrap();

            let mut tampered = payload.clone();
            let pos = pos % tampered.len();
            tampered[pos] ^= 1 << bit;

            let message = signing_message(&tampered, ts);
            prop_assert!(!verify(keypair.public_key(), &message, &signature, HashAlg::Sha256));
        }

        /// Flipping one timestamp bit breaks verification
        #[test]
        fn timestamp_bit_flip_fails(
            payload in payload_strategy(),
            ts in any::<i64>(),
            bit in 0u32..64,
        ) {
            let keypair = shared_keypair();
            let signature = sign(keypair, &signing_message(&payload, ts), HashAlg::Sha256).unwrap();

            let message = signing_message(&payload, ts ^ (1i64 << bit));
            prop_assert!(!verify(keypair.public_key(), &message, &signature, HashAlg::Sha256));
        }

        /// Flipping one signature bit breaks verification
        #[test]
        fn signature_bit_flip_fails(
            payload in payload_strategy(),
            ts in any::<i64>(),
            pos in any::<usize>(),
            bit in 0u8..8,
        ) {
            let keypair = shared_keypair();
            let message = signing_message(&payload, ts);
            let mut signature = sign(keypair, &message, HashAlg::Sha512).unwrap();

            let pos = pos % signature.len();
            signature[pos] ^= 1 << bit;

            prop_assert!(!verify(keypair.public_key(), &message, &signature, HashAlg::Sha512));
        }
    }
}

// =============================================================================
// TIMESTAMP PROPERTIES
// =============================================================================

mod timestamp_properties {
    use super::*;

    proptest! {
        /// Encoding decodes back to the same value
        #[test]
        fn le_encoding_is_reversible(ts in any::<i64>()) {
            prop_assert_eq!(i64::from_le_bytes(timestamp_le_bytes(ts)), ts);
        }

        /// The least significant byte always comes first
        #[test]
        fn least_significant_byte_first(ts in any::<i64>()) {
            let bytes = timestamp_le_bytes(ts);
            prop_assert_eq!(bytes[0], (ts & 0xFF) as u8);
            prop_assert_eq!(bytes[7], ((ts >> 56) & 0xFF) as u8);
        }

        /// The timestamp is always the trailing 8 bytes of the message
        #[test]
        fn message_ends_with_timestamp(payload in payload_strategy(), ts in any::<i64>()) {
            let message = signing_message(&payload, ts);
            prop_assert_eq!(&message[..payload.len()], payload.as_slice());
            prop_assert_eq!(&message[payload.len()..], &timestamp_le_bytes(ts)[..]);
        }
    }
}

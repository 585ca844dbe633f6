//! License key retrieval for desktop applications.
//!
//! This crate handles:
//! - A browser-approved authorization handshake that yields a short-lived
//!   session token without the application holding the user's credentials
//! - Proof of possession of an ephemeral RSA key via signed challenges
//! - Fetching the user's license list and verifying the server signature
//!   against a pinned public key
//! - Machine codes for device binding
//!
//! # Flow
//!
//! 1. Build an authorization request around a fresh key pair.
//! 2. Open the approval URL in the user's browser.
//! 3. Poll: sign each server challenge with the private key until the
//!    server, once the user approves, hands out a session token.
//! 4. Fetch the signed license list and verify it before reading it.
//!
//! # Trust
//!
//! - The handshake key pair and the pinned payload key are separate trust
//!   roots.
//! - A signature failure is always a hard rejection.
//! - A payload restricted to machine codes is rejected on other machines.

mod browser;
mod client;
mod config;
mod device;
mod error;
mod handshake;
mod license;
mod request;
mod response;
mod token;
mod transport;
mod verify;

pub use browser::{launcher_for, LaunchFn, SystemBrowser, UrlLauncher, LAUNCHERS};
pub use client::LicenseClient;
pub use config::{
    ClientConfig, HandshakeConfig, ProxySetting, TransportConfig, VerifyConfig,
    DEFAULT_EXPIRES_MINUTES, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_POLL_ATTEMPTS, POLL_INTERVAL_SECS,
};
pub use device::{device_name, MachineCode};
pub use error::{LicenseError, LicenseResult};
pub use handshake::{Handshake, HandshakeState};
pub use license::{ActivationData, Customer, LicensePayload, LicenseRecord};
pub use request::{
    endpoints, AuthorizationRequest, Capability, ChallengeRequest, ExchangeTokenRequest,
    FormRequest, LicenseKeysRequest, Scope, AUTHORIZATION_TOKEN_BYTES,
};
pub use response::{
    ApiResponse, ChallengeResponse, ExchangeTokenResponse, LicenseKeysResponse, ResultCode,
};
pub use token::{AccessToken, SessionToken};
pub use transport::{send, try_send, HttpTransport, Transport, TOKEN_FIELD};
pub use verify::{fetch_licenses, verify_payload, SignedLicensePayload, VerifiedLicenses};

pub use keygrant_crypto::PublicKey;
pub use tokio_util::sync::CancellationToken;

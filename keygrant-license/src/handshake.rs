//! Browser-approved authorization handshake.
//!
//! ```text
//! Created ──request_approval──▶ AwaitingUserApproval ──poll──▶ Polling
//!                                                               │
//!                          Authorized ◀── token issued ─────────┤
//!                          TimedOut   ◀── attempts exhausted ───┤
//!                          Cancelled  ◀── cancellation ─────────┤
//!                          Failed     ◀── signing failed ───────┘
//! ```
//!
//! Each polling attempt fetches a fresh challenge, signs
//! `challenge ‖ le64(now)` with the ephemeral key (SHA-512), and offers the
//! signature in exchange for a session token. The server only issues the
//! token once the user has approved the request in the browser, so a
//! failed attempt is normal while the user is still deciding. Transport
//! and server errors during polling are recorded and the loop continues.

use crate::browser::UrlLauncher;
use crate::config::HandshakeConfig;
use crate::device::{device_name, MachineCode};
use crate::error::{LicenseError, LicenseResult};
use crate::request::{AuthorizationRequest, ChallengeRequest, ExchangeTokenRequest};
use crate::response::{ApiResponse, ChallengeResponse, ExchangeTokenResponse};
use crate::token::{AccessToken, SessionToken};
use crate::transport::{try_send, Transport};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use keygrant_crypto::{signing_message, HashAlg, KeyPair};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where a handshake is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// The authorization request is built but not yet shown to the user.
    Created,
    /// The approval URL has been presented.
    AwaitingUserApproval,
    /// Polling for a session token; `attempt` is 1-based.
    Polling { attempt: u32 },
    /// A session token was issued and returned to the caller.
    Authorized,
    /// The attempt budget ran out before the user approved.
    TimedOut,
    /// The caller cancelled the wait.
    Cancelled,
    /// An unrecoverable local error ended the handshake.
    Failed(String),
}

impl HandshakeState {
    /// Returns true once the handshake can make no further progress.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Authorized | Self::TimedOut | Self::Cancelled | Self::Failed(_)
        )
    }
}

/// One authorization handshake.
///
/// Holds the ephemeral key pair for its whole life; the private key is
/// dropped with the handshake and never leaves the process.
pub struct Handshake<'a, T: Transport + ?Sized> {
    transport: &'a T,
    config: &'a HandshakeConfig,
    access_token: &'a AccessToken,
    keypair: KeyPair,
    request: AuthorizationRequest,
    state: HandshakeState,
    attempts: u32,
    last_error: Option<String>,
}

impl<'a, T: Transport + ?Sized> Handshake<'a, T> {
    /// Creates a handshake with a freshly generated key pair.
    ///
    /// Key generation is CPU-bound; async callers should generate the pair
    /// off the runtime and use [`Self::with_keypair`].
    ///
    /// # Errors
    ///
    /// Fails if the configuration is incomplete, the access token carries
    /// no numeric id, or key generation fails.
    pub fn new(
        transport: &'a T,
        config: &'a HandshakeConfig,
        access_token: &'a AccessToken,
        machine_code: &MachineCode,
    ) -> LicenseResult<Self> {
        // Validate before paying for key generation.
        config.validate()?;
        let keypair = KeyPair::generate()?;
        Self::assemble(transport, config, access_token, machine_code, keypair)
    }

    /// Creates a handshake around a caller-supplied key pair.
    pub fn with_keypair(
        transport: &'a T,
        config: &'a HandshakeConfig,
        access_token: &'a AccessToken,
        machine_code: &MachineCode,
        keypair: KeyPair,
    ) -> LicenseResult<Self> {
        config.validate()?;
        Self::assemble(transport, config, access_token, machine_code, keypair)
    }

    /// Builds the handshake from an already validated `config`.
    pub(crate) fn assemble(
        transport: &'a T,
        config: &'a HandshakeConfig,
        access_token: &'a AccessToken,
        machine_code: &MachineCode,
        keypair: KeyPair,
    ) -> LicenseResult<Self> {
        let token_id = access_token.token_id()?;
        let device = config.device_name.clone().unwrap_or_else(device_name);

        let request = AuthorizationRequest::new(
            keypair.public_key(),
            config,
            &device,
            machine_code.as_str(),
            token_id,
        )?;
        debug!(token_id, device = %device, "authorization request created");

        Ok(Self {
            transport,
            config,
            access_token,
            keypair,
            request,
            state: HandshakeState::Created,
            attempts: 0,
            last_error: None,
        })
    }

    #[must_use]
    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    #[must_use]
    pub fn request(&self) -> &AuthorizationRequest {
        &self.request
    }

    /// Number of polling attempts made so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The most recent error absorbed while polling.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The URL where the user approves this request.
    #[must_use]
    pub fn authorization_url(&self) -> String {
        self.request.authorization_url(&self.config.auth_base_url)
    }

    /// Presents the approval URL through `launcher` and returns it.
    ///
    /// A launcher failure is logged, not returned: the user can still open
    /// the URL by hand.
    pub fn request_approval(&mut self, launcher: &dyn UrlLauncher) -> String {
        let url = self.authorization_url();
        if let Err(e) = launcher.launch(&url) {
            warn!(error = %e, "could not open a browser; open the authorization URL manually");
        }
        info!(url = %url, "waiting for the user to approve the authorization request");
        self.state = HandshakeState::AwaitingUserApproval;
        url
    }

    /// Polls until a session token is issued, the attempt budget runs
    /// out, or `cancel` fires.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::Timeout`] after `max_attempts` failed attempts
    /// - [`LicenseError::Cancelled`] if `cancel` fires
    /// - [`LicenseError::Crypto`] if the challenge cannot be signed
    pub async fn poll(&mut self, cancel: &CancellationToken) -> LicenseResult<SessionToken> {
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            self.state = HandshakeState::Polling { attempt };
            self.attempts = attempt;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                outcome = self.attempt() => Some(outcome),
            };
            let Some(outcome) = outcome else {
                return Err(self.cancelled());
            };

            match outcome {
                Ok(Some(token)) => {
                    info!(attempt, "authorization approved");
                    self.state = HandshakeState::Authorized;
                    return Ok(token);
                }
                Ok(None) => {
                    debug!(attempt, "no session token yet");
                }
                Err(LicenseError::Crypto(e)) => {
                    self.state = HandshakeState::Failed(e.to_string());
                    return Err(LicenseError::Crypto(e));
                }
                Err(e) => {
                    debug!(attempt, error = %e, "polling attempt failed");
                    self.last_error = Some(e.to_string());
                }
            }

            if attempt < max_attempts {
                let woke = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = tokio::time::sleep(self.config.poll_interval()) => true,
                };
                if !woke {
                    return Err(self.cancelled());
                }
            }
        }

        warn!(
            attempts = max_attempts,
            last_error = self.last_error.as_deref().unwrap_or("none"),
            "authorization timed out"
        );
        self.state = HandshakeState::TimedOut;
        Err(LicenseError::Timeout)
    }

    /// Presents the approval URL, then polls. See [`Self::poll`].
    pub async fn run(
        &mut self,
        launcher: &dyn UrlLauncher,
        cancel: &CancellationToken,
    ) -> LicenseResult<SessionToken> {
        self.request_approval(launcher);
        self.poll(cancel).await
    }

    /// One challenge/exchange round. `Ok(None)` means no token yet.
    async fn attempt(&self) -> LicenseResult<Option<SessionToken>> {
        let bearer = self.access_token.as_str();
        let authorization_token = self.request.authorization_token();

        let challenge: ChallengeResponse =
            try_send(self.transport, &ChallengeRequest { authorization_token }, bearer).await?;
        let challenge = challenge.into_success()?.challenge_bytes()?;

        let date = chrono::Utc::now().timestamp();
        let message = signing_message(&challenge, date);
        let signature = self.keypair.sign(&message, HashAlg::Sha512)?;

        let exchange = ExchangeTokenRequest {
            authorization_token,
            signature: BASE64.encode(signature),
            date,
        };
        let reply: ExchangeTokenResponse = try_send(self.transport, &exchange, bearer).await?;

        Ok(reply
            .into_success()?
            .token
            .filter(|t| !t.is_empty())
            .map(SessionToken::new))
    }

    fn cancelled(&mut self) -> LicenseError {
        info!(attempt = self.attempts, "authorization cancelled");
        self.state = HandshakeState::Cancelled;
        LicenseError::Cancelled
    }
}

impl<T: Transport + ?Sized> std::fmt::Debug for Handshake<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handshake")
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

//! High-level client: authorize, then fetch verified licenses.

use crate::browser::{SystemBrowser, UrlLauncher};
use crate::config::ClientConfig;
use crate::device::MachineCode;
use crate::error::LicenseResult;
use crate::handshake::Handshake;
use crate::token::{AccessToken, SessionToken};
use crate::transport::{HttpTransport, Transport};
use crate::verify::{self, VerifiedLicenses};
use keygrant_crypto::{CryptoError, KeyPair, PublicKey};
use tokio_util::sync::CancellationToken;

/// Runs the authorization handshake and the verified license fetch.
///
/// The polling loop can take minutes while the user decides. Run the
/// client on a spawned task and cancel through the [`CancellationToken`]
/// if the user gives up.
pub struct LicenseClient<T: Transport = HttpTransport> {
    transport: T,
    config: ClientConfig,
    pinned_key: PublicKey,
    launcher: Box<dyn UrlLauncher>,
}

impl LicenseClient<HttpTransport> {
    /// Creates a client talking HTTP to the configured API.
    ///
    /// `pinned_key` is the key license payloads must be signed with.
    pub fn new(config: ClientConfig, pinned_key: PublicKey) -> LicenseResult<Self> {
        let transport = HttpTransport::new(&config.transport)?;
        Ok(Self::with_transport(transport, config, pinned_key))
    }
}

impl<T: Transport> LicenseClient<T> {
    /// Creates a client over an arbitrary transport.
    pub fn with_transport(transport: T, config: ClientConfig, pinned_key: PublicKey) -> Self {
        Self {
            transport,
            config,
            pinned_key,
            launcher: Box::new(SystemBrowser::new()),
        }
    }

    /// Replaces the browser launcher.
    #[must_use]
    pub fn with_launcher(mut self, launcher: impl UrlLauncher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Starts a handshake without presenting or polling it.
    ///
    /// Generates the key pair on the calling thread.
    pub fn begin_authorization<'a>(
        &'a self,
        access_token: &'a AccessToken,
        machine_code: &MachineCode,
    ) -> LicenseResult<Handshake<'a, T>> {
        Handshake::new(
            &self.transport,
            &self.config.handshake,
            access_token,
            machine_code,
        )
    }

    /// Runs a complete handshake and returns the session token.
    pub async fn authorize(
        &self,
        access_token: &AccessToken,
        machine_code: &MachineCode,
        cancel: &CancellationToken,
    ) -> LicenseResult<SessionToken> {
        let config = &self.config.handshake;
        config.validate()?;

        // CPU-bound; runs on the blocking pool.
        let keypair = tokio::task::spawn_blocking(KeyPair::generate)
            .await
            .map_err(|e| CryptoError::KeyGeneration(format!("key generation task failed: {e}")))??;

        let mut handshake =
            Handshake::assemble(&self.transport, config, access_token, machine_code, keypair)?;
        handshake.run(self.launcher.as_ref(), cancel).await
    }

    /// Fetches and verifies the license list with an existing session token.
    pub async fn fetch_licenses(
        &self,
        session_token: SessionToken,
        machine_code: &MachineCode,
    ) -> LicenseResult<VerifiedLicenses> {
        verify::fetch_licenses(
            &self.transport,
            session_token,
            &self.pinned_key,
            machine_code,
            &self.config.verify,
        )
        .await
    }

    /// Authorizes, then fetches the verified license list.
    pub async fn get_license_keys(
        &self,
        access_token: &AccessToken,
        machine_code: &MachineCode,
        cancel: &CancellationToken,
    ) -> LicenseResult<VerifiedLicenses> {
        let session_token = self.authorize(access_token, machine_code, cancel).await?;
        self.fetch_licenses(session_token, machine_code).await
    }
}

//! Argument parsing and output for the `keygrant` binary.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use keygrant_license::{
    ClientConfig, HandshakeConfig, LicenseResult, MachineCode, ProxySetting, PublicKey,
    TransportConfig, UrlLauncher, VerifiedLicenses, VerifyConfig, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "keygrant")]
#[command(about = "Retrieve and verify license keys for this machine")]
pub struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Approve access in the browser, then list this machine's licenses
    Authorize(AuthorizeArgs),
    /// Print this machine's code
    MachineCode,
}

#[derive(Args, Debug)]
pub struct AuthorizeArgs {
    /// Base URL of the licensing API
    #[arg(long, env = "KEYGRANT_API_URL")]
    pub api_url: String,

    /// URL of the page where the request is approved
    #[arg(long, env = "KEYGRANT_AUTH_URL")]
    pub auth_url: String,

    /// Application name shown on the approval page
    #[arg(long, default_value = "keygrant")]
    pub app_name: String,

    /// Access token issued to the application
    #[arg(long, env = "KEYGRANT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Key the license list must be signed with (PEM or DER file)
    #[arg(long)]
    pub public_key: PathBuf,

    /// Use this machine code instead of the computed one
    #[arg(long)]
    pub machine_code: Option<String>,

    /// Device name shown on the approval page
    #[arg(long)]
    pub device_name: Option<String>,

    /// Send requests through this proxy
    #[arg(long, conflicts_with = "no_proxy")]
    pub proxy: Option<String>,

    /// Ignore proxy environment variables
    #[arg(long)]
    pub no_proxy: bool,

    /// Reject license lists signed more than this many seconds ago
    #[arg(long)]
    pub max_age: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Print the approval URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Print the licenses as JSON
    #[arg(long)]
    pub json: bool,
}

impl AuthorizeArgs {
    pub fn client_config(&self) -> ClientConfig {
        let proxy = match (&self.proxy, self.no_proxy) {
            (Some(url), _) => ProxySetting::Explicit(url.clone()),
            (None, true) => ProxySetting::Direct,
            (None, false) => ProxySetting::System,
        };

        ClientConfig {
            transport: TransportConfig {
                api_base_url: self.api_url.clone(),
                request_timeout_secs: self.timeout,
                proxy,
            },
            handshake: HandshakeConfig {
                auth_base_url: self.auth_url.clone(),
                app_name: self.app_name.clone(),
                device_name: self.device_name.clone(),
                ..Default::default()
            },
            verify: VerifyConfig {
                max_signature_age_secs: self.max_age,
            },
        }
    }

    pub fn machine_code(&self) -> MachineCode {
        match &self.machine_code {
            Some(code) => MachineCode::new(code.clone()),
            None => MachineCode::current(),
        }
    }
}

/// Reads a pinned public key from a PEM or DER file.
pub fn load_public_key(path: &Path) -> Result<PublicKey> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read public key {}", path.display()))?;

    let key = match std::str::from_utf8(&bytes) {
        Ok(text) if text.trim_start().starts_with("-----BEGIN") => PublicKey::from_pem(text),
        _ => PublicKey::from_der(&bytes),
    };
    key.with_context(|| format!("{} is not an RSA public key", path.display()))
}

/// Prints the approval URL instead of opening it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintUrl;

impl UrlLauncher for PrintUrl {
    fn launch(&self, url: &str) -> LicenseResult<()> {
        println!("Open this URL to approve access:\n\n  {url}\n");
        Ok(())
    }
}

/// Human-readable license listing.
pub fn render_licenses(verified: &VerifiedLicenses, machine_code: &MachineCode) -> String {
    let mut out = String::new();
    let _ = write!(out, "Licenses for machine {machine_code}");
    if let Some(signed_at) = verified.signed_at {
        let _ = write!(out, " (signed {signed_at})");
    }
    out.push('\n');

    if verified.licenses.is_empty() {
        out.push_str("  none\n");
        return out;
    }

    for license in &verified.licenses {
        let expires = license
            .expires_at()
            .map_or_else(|| "never".to_string(), |t| t.to_string());
        let _ = write!(
            out,
            "  {}  product {}  expires {}",
            license.key, license.product_id, expires
        );
        if license.block {
            out.push_str("  [blocked]");
        }
        out.push('\n');
    }
    out
}

/// License records as pretty-printed JSON.
pub fn licenses_json(verified: &VerifiedLicenses) -> Result<String> {
    serde_json::to_string_pretty(&verified.licenses).context("failed to serialize licenses")
}

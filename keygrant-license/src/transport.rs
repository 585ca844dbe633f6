//! HTTP transport to the licensing API.
//!
//! Requests are form-encoded POSTs carrying the request's fields plus a
//! bearer `token` field. Responses are JSON. The transport never retries;
//! retry policy belongs to the caller.

use crate::config::{ProxySetting, TransportConfig};
use crate::error::{LicenseError, LicenseResult};
use crate::request::FormRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Name of the bearer token form field.
pub const TOKEN_FIELD: &str = "token";

/// Posts form bodies to API endpoints.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Posts `form` to `endpoint` and returns the raw response body.
    async fn post_form(
        &self,
        endpoint: &str,
        form: Vec<(&'static str, String)>,
    ) -> LicenseResult<Vec<u8>>;
}

/// Sends `request` with `token` and parses the JSON reply.
///
/// # Errors
///
/// Network failures, timeouts and malformed bodies all surface as
/// [`LicenseError::Network`].
pub async fn try_send<R, Q, T>(transport: &T, request: &Q, token: &str) -> LicenseResult<R>
where
    R: DeserializeOwned,
    Q: FormRequest + Sync,
    T: Transport + ?Sized,
{
    let mut form = request.form_fields();
    form.push((TOKEN_FIELD, token.to_string()));

    let body = transport.post_form(Q::ENDPOINT, form).await?;
    serde_json::from_slice(&body).map_err(|e| {
        LicenseError::Network(format!("malformed response from {}: {e}", Q::ENDPOINT))
    })
}

/// Like [`try_send`], but maps every failure to `None`.
pub async fn send<R, Q, T>(transport: &T, request: &Q, token: &str) -> Option<R>
where
    R: DeserializeOwned,
    Q: FormRequest + Sync,
    T: Transport + ?Sized,
{
    match try_send(transport, request, token).await {
        Ok(reply) => Some(reply),
        Err(e) => {
            debug!(endpoint = Q::ENDPOINT, error = %e, "request yielded no result");
            None
        }
    }
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Builds the HTTP client described by `config`.
    pub fn new(config: &TransportConfig) -> LicenseResult<Self> {
        let base_url = config.api_base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(LicenseError::Config("api_base_url is empty".to_string()));
        }

        let builder = Client::builder().timeout(config.request_timeout());
        let builder = match &config.proxy {
            // reqwest reads the proxy environment once per process and
            // honours NO_PROXY and per-scheme variables.
            ProxySetting::System => builder,
            ProxySetting::Direct => builder.no_proxy(),
            ProxySetting::Explicit(url) => match reqwest::Proxy::all(url) {
                Ok(proxy) => {
                    debug!(proxy = %url, "using proxy");
                    builder.proxy(proxy)
                }
                Err(e) => {
                    warn!(proxy = %url, error = %e, "ignoring unusable proxy");
                    builder.no_proxy()
                }
            },
        };

        let client = builder
            .build()
            .map_err(|e| LicenseError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Returns the API base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(
        &self,
        endpoint: &str,
        form: Vec<(&'static str, String)>,
    ) -> LicenseResult<Vec<u8>> {
        let url = format!("{}{endpoint}", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| LicenseError::Network(format!("request to {endpoint} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LicenseError::Network(format!("{endpoint} returned HTTP {status}")));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| LicenseError::Network(format!("reading {endpoint} response failed: {e}")))
    }
}

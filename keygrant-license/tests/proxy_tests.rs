//! Proxy environment handling. Kept in its own test binary: the HTTP client
//! reads the proxy variables once per process, so they must be set before
//! any client is built.

use keygrant_license::{
    endpoints, try_send, ChallengeRequest, ChallengeResponse, HttpTransport, LicenseError,
    ProxySetting, TransportConfig,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Nothing listens on the discard port.
const DEAD_PROXY: &str = "http://127.0.0.1:9";

async fn challenge_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::ISSUE_CHALLENGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Result": "Success",
            "Challenge": "AQIDBAU="
        })))
        .mount(&server)
        .await;
    server
}

async fn challenge(
    server: &MockServer,
    proxy: ProxySetting,
) -> Result<ChallengeResponse, LicenseError> {
    let transport = HttpTransport::new(&TransportConfig {
        api_base_url: server.uri(),
        request_timeout_secs: 5,
        proxy,
    })?;
    try_send(
        &transport,
        &ChallengeRequest {
            authorization_token: "abc",
        },
        "t",
    )
    .await
}

#[tokio::test]
async fn proxy_environment_is_honoured() {
    // SAFETY: the only test in this binary; no other thread reads the
    // environment yet.
    unsafe {
        for var in [
            "HTTPS_PROXY",
            "https_proxy",
            "HTTP_PROXY",
            "http_proxy",
            "ALL_PROXY",
            "all_proxy",
        ] {
            std::env::set_var(var, DEAD_PROXY);
        }
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        std::env::set_var("no_proxy", "127.0.0.1,localhost");
    }

    let server = challenge_server().await;

    // NO_PROXY exempts the local server from the environment proxy
    let reply = challenge(&server, ProxySetting::System).await.unwrap();
    assert_eq!(reply.challenge_bytes().unwrap(), vec![1, 2, 3, 4, 5]);

    assert!(challenge(&server, ProxySetting::Direct).await.is_ok());

    // an explicit proxy applies to every request
    let err = challenge(&server, ProxySetting::Explicit(DEAD_PROXY.to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, LicenseError::Network(_)));
}

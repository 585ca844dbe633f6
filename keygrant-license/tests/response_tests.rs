use keygrant_license::{
    ApiResponse, ChallengeResponse, ExchangeTokenResponse, LicenseError, LicenseKeysResponse,
    ResultCode,
};

// ── ResultCode ───────────────────────────────────────────────────

#[test]
fn result_code_from_names() {
    let ok: ResultCode = serde_json::from_str(r#""Success""#).unwrap();
    let err: ResultCode = serde_json::from_str(r#""error""#).unwrap();
    assert_eq!(ok, ResultCode::Success);
    assert_eq!(err, ResultCode::Error);
}

#[test]
fn result_code_from_numbers() {
    let ok: ResultCode = serde_json::from_str("0").unwrap();
    let err: ResultCode = serde_json::from_str("1").unwrap();
    assert_eq!(ok, ResultCode::Success);
    assert_eq!(err, ResultCode::Error);
}

#[test]
fn result_code_rejects_unknown() {
    assert!(serde_json::from_str::<ResultCode>("7").is_err());
    assert!(serde_json::from_str::<ResultCode>(r#""Maybe""#).is_err());
}

// ── Envelopes ────────────────────────────────────────────────────

#[test]
fn challenge_response_decodes_bytes() {
    let resp: ChallengeResponse =
        serde_json::from_str(r#"{"Result":0,"Message":null,"Challenge":"AQIDBAU="}"#).unwrap();
    assert_eq!(resp.challenge_bytes().unwrap(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn challenge_response_without_challenge() {
    let resp: ChallengeResponse = serde_json::from_str(r#"{"Result":"Success"}"#).unwrap();
    assert!(matches!(
        resp.challenge_bytes(),
        Err(LicenseError::Network(_))
    ));
}

#[test]
fn error_result_becomes_server_error() {
    let resp: ChallengeResponse =
        serde_json::from_str(r#"{"Result":"Error","Message":"invalid token"}"#).unwrap();
    let err = resp.into_success().unwrap_err();
    assert_eq!(
        err.to_string(),
        "An error occurred in the method: invalid token"
    );
}

#[test]
fn error_result_without_message() {
    let resp: ExchangeTokenResponse = serde_json::from_str(r#"{"Result":1}"#).unwrap();
    assert!(matches!(
        resp.into_success(),
        Err(LicenseError::Server(msg)) if msg == "unknown error"
    ));
}

#[test]
fn success_passes_through() {
    let resp: ExchangeTokenResponse =
        serde_json::from_str(r#"{"Result":"Success","Token":"tok"}"#).unwrap();
    let resp = resp.into_success().unwrap();
    assert_eq!(resp.token.as_deref(), Some("tok"));
    assert_eq!(resp.message(), None);
}

#[test]
fn license_keys_response_fields() {
    let resp: LicenseKeysResponse = serde_json::from_str(
        r#"{"Result":"Success","Results":"e30=","Signature":"c2ln","SignDate":1700000000}"#,
    )
    .unwrap();
    assert_eq!(resp.result(), ResultCode::Success);
    assert_eq!(resp.results.as_deref(), Some("e30="));
    assert_eq!(resp.signature.as_deref(), Some("c2ln"));
    assert_eq!(resp.sign_date, Some(1_700_000_000));
}

#[test]
fn missing_result_is_rejected() {
    assert!(serde_json::from_str::<ExchangeTokenResponse>(r#"{"Token":"x"}"#).is_err());
}

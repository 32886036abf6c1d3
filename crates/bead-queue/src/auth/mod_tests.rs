//! Tests for authorisation types.

use super::*;
use chrono::Duration;

#[test]
fn test_secret_debug_is_redacted() {
    let secret = Secret::new("super-secret-value");

    let debug = format!("{:?}", secret);
    assert_eq!(debug, "[REDACTED]");
    assert!(!debug.contains("super-secret-value"));
    assert_eq!(secret.expose_secret(), "super-secret-value");
}

#[test]
fn test_secret_deserializes_from_string() {
    let secret: Secret = serde_json::from_str("\"abc\"").unwrap();
    assert_eq!(secret.expose_secret(), "abc");
}

#[test]
fn test_credential_delegates_to_oauth2_token() {
    let now = Utc::now();
    let token = OAuth2Token::new(
        "access",
        "Bearer",
        now - Duration::minutes(1),
        now + Duration::minutes(59),
        "https://servicebus.azure.net",
    );
    let credential = Credential::from(token);

    assert!(!credential.has_expired());
    assert_eq!(
        credential.headers().get(AUTHORIZATION_HEADER),
        Some(&"Bearer access".to_string())
    );
}

#[test]
fn test_credential_delegates_to_sas_token() {
    let expired = Credential::from(SasToken::new(
        "https://ns.servicebus.windows.net/q",
        "RootManageSharedAccessKey",
        "key",
        Utc::now() - Duration::seconds(1),
    )
    .unwrap());

    assert!(expired.has_expired());
    let header = expired.headers().remove(AUTHORIZATION_HEADER).unwrap();
    assert!(header.starts_with("SharedAccessSignature "));
}

#[test]
fn test_credential_debug_does_not_leak_secrets() {
    let now = Utc::now();
    let credential = Credential::from(OAuth2Token::new(
        "very-secret-token",
        "Bearer",
        now,
        now + Duration::hours(1),
        "resource",
    ));

    assert!(!format!("{:?}", credential).contains("very-secret-token"));
}

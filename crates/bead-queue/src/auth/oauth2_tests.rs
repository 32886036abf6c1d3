//! Tests for OAuth2 access tokens and the token endpoint client.

use super::*;
use chrono::Duration;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn credentials() -> ClientCredentials {
    ClientCredentials::new("tenant-1", "client-1", "s3cret")
}

// ============================================================================
// Token Tests
// ============================================================================

mod token_tests {
    use super::*;

    #[test]
    fn test_token_valid_inside_window() {
        let now = Utc::now();
        let token = OAuth2Token::new(
            "abc",
            "Bearer",
            now - Duration::minutes(1),
            now + Duration::minutes(10),
            SERVICE_BUS_RESOURCE,
        );

        assert!(!token.has_expired());
    }

    #[test]
    fn test_token_expired_when_expires_on_in_past() {
        let now = Utc::now();
        let token = OAuth2Token::new(
            "abc",
            "Bearer",
            now - Duration::hours(2),
            now - Duration::hours(1),
            SERVICE_BUS_RESOURCE,
        );

        assert!(token.has_expired());
    }

    #[test]
    fn test_token_expired_when_not_before_in_future() {
        let now = Utc::now();
        let token = OAuth2Token::new(
            "abc",
            "Bearer",
            now + Duration::minutes(5),
            now + Duration::hours(1),
            SERVICE_BUS_RESOURCE,
        );

        assert!(token.has_expired());
    }

    #[test]
    fn test_token_expired_exactly_at_expires_on() {
        let now = Utc::now();
        let token = OAuth2Token::new("abc", "Bearer", now - Duration::hours(1), now, "r");

        assert!(token.has_expired_at(now));
        assert!(!token.has_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_token_headers_use_token_type() {
        let now = Utc::now();
        let token = OAuth2Token::new("abc", "Bearer", now, now + Duration::hours(1), "r");

        let headers = token.headers();

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Authorization"), Some(&"Bearer abc".to_string()));
    }
}

// ============================================================================
// Token Endpoint Tests
// ============================================================================

mod endpoint_tests {
    use super::*;

    #[test]
    fn test_token_endpoint_layout() {
        let authoriser = OAuth2Authoriser::new(credentials());
        assert_eq!(
            authoriser.token_endpoint("tenant-1"),
            "https://login.microsoftonline.com/tenant-1/oauth2/token"
        );

        let custom = OAuth2Authoriser::new(credentials()).with_authority("http://localhost:1234/");
        assert_eq!(
            custom.token_endpoint("t"),
            "http://localhost:1234/t/oauth2/token"
        );
    }

    #[test]
    fn test_grant_type_wire_values() {
        assert_eq!(GrantType::ClientCredentials.as_str(), "client_credentials");
        assert_eq!(GrantType::Custom("password".to_string()).as_str(), "password");
    }

    #[tokio::test]
    async fn test_request_token_parses_string_epochs() {
        let mock_server = MockServer::start().await;
        let now = Utc::now().timestamp();

        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-1"))
            .and(body_string_contains("client_secret=s3cret"))
            .and(body_string_contains("resource=https%3A%2F%2Fservicebus.azure.net"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": "3599",
                "not_before": (now - 10).to_string(),
                "expires_on": (now + 3599).to_string(),
                "resource": "https://servicebus.azure.net",
                "access_token": "eyJ0eXAi"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let authoriser = OAuth2Authoriser::new(credentials()).with_authority(mock_server.uri());
        let token = authoriser
            .request_token(SERVICE_BUS_RESOURCE, &GrantType::ClientCredentials, &credentials())
            .await
            .unwrap();

        assert_eq!(token.token(), "eyJ0eXAi");
        assert_eq!(token.token_type(), "Bearer");
        assert_eq!(token.expires_on().timestamp(), now + 3599);
        assert_eq!(token.resource(), SERVICE_BUS_RESOURCE);
        assert!(!token.has_expired());
    }

    #[tokio::test]
    async fn test_authorise_accepts_numeric_epochs() {
        let mock_server = MockServer::start().await;
        let now = Utc::now().timestamp();

        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "not_before": now - 10,
                "expires_on": now + 600,
                "access_token": "numeric"
            })))
            .mount(&mock_server)
            .await;

        let authoriser = OAuth2Authoriser::new(credentials()).with_authority(mock_server.uri());
        let credential = authoriser.authorise("https://example.test").await.unwrap();

        match credential {
            Credential::OAuth2(token) => {
                assert_eq!(token.token(), "numeric");
                assert_eq!(token.resource(), "https://example.test");
            }
            other => panic!("expected OAuth2 credential, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_credentials_surface_description() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&mock_server)
            .await;

        let authoriser = OAuth2Authoriser::new(credentials()).with_authority(mock_server.uri());
        let result = authoriser.authorise(SERVICE_BUS_RESOURCE).await;

        match result {
            Err(AuthorisationError::Rejected {
                status, message, ..
            }) => {
                assert_eq!(status, 401);
                assert!(message.contains("AADSTS7000215"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&mock_server)
            .await;

        let authoriser = OAuth2Authoriser::new(credentials()).with_authority(mock_server.uri());
        let error = authoriser.authorise(SERVICE_BUS_RESOURCE).await.unwrap_err();

        assert!(matches!(
            error,
            AuthorisationError::ServiceError { status: 503, .. }
        ));
        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn test_malformed_token_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let authoriser = OAuth2Authoriser::new(credentials()).with_authority(mock_server.uri());
        let error = authoriser.authorise(SERVICE_BUS_RESOURCE).await.unwrap_err();

        assert!(matches!(error, AuthorisationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_network_failure_is_authorisation_error() {
        // Nothing listens on port 9 of localhost in the test environment
        let authoriser =
            OAuth2Authoriser::new(credentials()).with_authority("http://127.0.0.1:9");
        let error = authoriser.authorise(SERVICE_BUS_RESOURCE).await.unwrap_err();

        assert!(matches!(error, AuthorisationError::Network(_)));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let authoriser = OAuth2Authoriser::new(ClientCredentials::new("", "client", "secret"))
            .with_authority("http://127.0.0.1:9");
        let error = authoriser.authorise(SERVICE_BUS_RESOURCE).await.unwrap_err();

        assert!(matches!(error, AuthorisationError::Configuration(_)));
    }

    #[test]
    fn test_authoriser_debug_omits_secret() {
        let authoriser = OAuth2Authoriser::new(credentials());
        assert!(!format!("{:?}", authoriser).contains("s3cret"));
    }
}

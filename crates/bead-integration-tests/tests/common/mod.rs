//! Common test utilities for bead integration tests
//!
//! This module provides:
//! - A token authority mock answering the client-credentials flow
//! - Queue endpoints pointed at a mock server
//! - BrokerProperties builders for fetch responses

use bead_queue::{Namespace, QueueEndpoint, QueueName};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_ID: &str = "test-tenant";
pub const ACCESS_TOKEN: &str = "eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiJ9.test";

/// Queue endpoint for `jobs` in `test-namespace` served by `server`
#[allow(dead_code)]
pub fn mock_endpoint(server: &MockServer) -> QueueEndpoint {
    QueueEndpoint::new(
        Namespace::new("test-namespace").unwrap(),
        QueueName::new("jobs").unwrap(),
    )
    .with_base_url(&server.uri())
    .unwrap()
}

/// Answer one token request for the Service Bus audience with a Bearer token
#[allow(dead_code)]
pub async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    let expires_on = chrono::Utc::now().timestamp() + 3600;

    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/token", TENANT_ID)))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": "3599",
            "expires_on": expires_on.to_string(),
            "resource": "https://servicebus.azure.net",
            "access_token": ACCESS_TOKEN,
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// BrokerProperties header value for a locked message
#[allow(dead_code)]
pub fn broker_properties(message_id: &str, lock_token: &str) -> String {
    json!({
        "MessageId": message_id,
        "LockToken": lock_token,
        "DeliveryCount": 1,
        "SequenceNumber": 11,
    })
    .to_string()
}

//! Tests for error types.

use super::*;

#[test]
fn test_error_transience() {
    assert!(QueueError::OperationFailed {
        operation: "send".to_string(),
        queue: "q".to_string(),
        namespace: "ns".to_string(),
        status: 503,
        reason: "Service Unavailable".to_string(),
    }
    .is_transient());

    assert!(!QueueError::OperationFailed {
        operation: "send".to_string(),
        queue: "q".to_string(),
        namespace: "ns".to_string(),
        status: 401,
        reason: "Unauthorized".to_string(),
    }
    .is_transient());

    assert!(!QueueError::LockLost {
        queue: "q".to_string(),
        message_id: "m1".to_string(),
    }
    .is_transient());

    assert!(QueueError::Transport {
        queue: "q".to_string(),
        namespace: "ns".to_string(),
        source: TransportError::Timeout {
            message: "deadline".to_string(),
        },
    }
    .is_transient());
}

#[test]
fn test_authorisation_error_kept_distinct() {
    let error: QueueError = AuthorisationError::Rejected {
        authority: "https://login.microsoftonline.com".to_string(),
        status: 401,
        message: "invalid_client".to_string(),
    }
    .into();

    assert!(matches!(error, QueueError::Authorisation(_)));
    assert!(!error.is_transient());

    let network: QueueError = AuthorisationError::Network("reset".to_string()).into();
    assert!(network.is_transient());
}

#[test]
fn test_operation_error_message_names_queue_and_namespace() {
    let error = QueueError::MessageOperationFailed {
        operation: "delete".to_string(),
        message_id: "m1".to_string(),
        queue: "orders".to_string(),
        namespace: "contoso".to_string(),
        status: 404,
        reason: "Not Found".to_string(),
    };

    let text = error.to_string();
    assert!(text.contains("m1"));
    assert!(text.contains("orders"));
    assert!(text.contains("contoso"));
    assert!(text.contains("Not Found"));
    assert_eq!(error.status(), Some(404));
}

#[test]
fn test_config_not_found_maps_to_missing() {
    let error: ConfigurationError = config::ConfigError::NotFound("queue.namespace".to_string()).into();
    assert!(matches!(error, ConfigurationError::Missing { key } if key == "queue.namespace"));
}

//! Tests for the crate-level API surface.

use super::*;
use bytes::Bytes;
use std::sync::Arc;

#[tokio::test]
async fn test_queue_is_object_safe() {
    let queue: Arc<dyn Queue> = Arc::new(InMemoryQueue::new(QueueName::new("jobs").unwrap()));

    queue.put(Bytes::from("work")).await.unwrap();
    let message = queue.peek().await.unwrap().unwrap();
    queue.delete(&message).await.unwrap();

    assert_eq!(queue.name().as_str(), "jobs");
    assert!(queue.get().await.unwrap().is_none());
}

#[test]
fn test_transport_and_authoriser_are_object_safe() {
    fn accepts(_transport: &dyn RestTransport, _authoriser: &dyn Authoriser) {}

    let transport = HttpTransport::new().unwrap();
    let authoriser = SasAuthoriser::new("policy", "key");
    accepts(&transport, &authoriser);
}

#[test]
fn test_error_conversions() {
    let error: QueueError = ValidationError::Required {
        field: "queue".to_string(),
    }
    .into();
    assert!(matches!(error, QueueError::Validation(_)));

    let error: QueueError = AuthorisationError::Network("down".to_string()).into();
    assert!(error.is_transient());
}

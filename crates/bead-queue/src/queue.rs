//! The provider-agnostic queue contract.

use crate::error::QueueError;
use crate::message::{QueueMessage, QueueName};
use async_trait::async_trait;
use bytes::Bytes;

/// Interface implemented by every queue backend
///
/// `peek` hands out a locked message that stays in the queue until it is
/// deleted or released; `get` removes the message as it is fetched. Both
/// return `None` when the queue has nothing to offer.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Name of the queue this instance talks to
    fn name(&self) -> &QueueName;

    /// Append one message
    async fn put(&self, payload: Bytes) -> Result<(), QueueError>;

    /// Append several messages, preserving their order
    async fn put_batch(&self, payloads: Vec<Bytes>) -> Result<(), QueueError>;

    /// Lock and return the message at the head of the queue
    async fn peek(&self) -> Result<Option<QueueMessage>, QueueError>;

    /// Remove and return the message at the head of the queue
    async fn get(&self) -> Result<Option<QueueMessage>, QueueError>;

    /// Remove a previously peeked message
    async fn delete(&self, message: &QueueMessage) -> Result<(), QueueError>;

    /// Give up the lock on a peeked message so other consumers can take it
    async fn release(&self, message: &QueueMessage) -> Result<(), QueueError>;

    /// Extend the lock on a peeked message
    async fn renew_lock(&self, message: &QueueMessage) -> Result<(), QueueError>;
}

//! `Queue` implementation backed by the Service Bus REST surface.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::commands::{
    BatchSendCommand, DeleteCommand, PeekCommand, ReceiveCommand, ReleaseCommand,
    RenewLockCommand, RestCommand, SendCommand, UnlockCommand,
};
use super::endpoint::QueueEndpoint;
use super::transport::{execute, RestTransport};
use crate::auth::{Authorisation, Authoriser, Credential, SERVICE_BUS_RESOURCE};
use crate::error::QueueError;
use crate::message::{QueueMessage, QueueName};
use crate::queue::Queue;

/// A Service Bus queue reached through a transport and an authoriser
///
/// The credential is cached and only re-acquired once it reports itself as
/// expired. Callers holding the previous credential keep a valid `Arc`.
pub struct AzureServiceBusQueue<T, A> {
    endpoint: QueueEndpoint,
    transport: T,
    authoriser: A,
    resource: String,
    credential: RwLock<Option<Arc<Credential>>>,
}

impl<T, A> AzureServiceBusQueue<T, A>
where
    T: RestTransport,
    A: Authoriser,
{
    /// Create a queue client authorising against the Service Bus resource
    pub fn new(endpoint: QueueEndpoint, transport: T, authoriser: A) -> Self {
        Self {
            endpoint,
            transport,
            authoriser,
            resource: SERVICE_BUS_RESOURCE.to_string(),
            credential: RwLock::new(None),
        }
    }

    /// Authorise for another resource
    ///
    /// SAS tokens are scoped to a URI, usually [`QueueEndpoint::queue_uri`].
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Get endpoint
    pub fn endpoint(&self) -> &QueueEndpoint {
        &self.endpoint
    }

    /// Resource credentials are requested for
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Unlock a peeked message
    pub async fn unlock(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.run(UnlockCommand::for_message(self.endpoint.clone(), message))
            .await
    }

    /// Return the cached credential, authorising again when it has expired
    async fn credential(&self) -> Result<Arc<Credential>, QueueError> {
        {
            let cached = self.credential.read().await;
            if let Some(credential) = cached.as_ref() {
                if !credential.has_expired() {
                    return Ok(Arc::clone(credential));
                }
            }
        }

        let mut cached = self.credential.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(credential) = cached.as_ref() {
            if !credential.has_expired() {
                return Ok(Arc::clone(credential));
            }
        }

        info!(
            queue = %self.endpoint.queue(),
            namespace = %self.endpoint.namespace(),
            resource = %self.resource,
            "Acquiring Service Bus credential"
        );

        let credential = Arc::new(self.authoriser.authorise(&self.resource).await?);
        *cached = Some(Arc::clone(&credential));

        Ok(credential)
    }

    async fn run<C: RestCommand>(&self, command: C) -> Result<C::Output, QueueError> {
        let credential = self.credential().await?;
        execute(&self.transport, &command, &*credential).await
    }
}

#[async_trait]
impl<T, A> Queue for AzureServiceBusQueue<T, A>
where
    T: RestTransport,
    A: Authoriser,
{
    fn name(&self) -> &QueueName {
        self.endpoint.queue()
    }

    async fn put(&self, payload: Bytes) -> Result<(), QueueError> {
        self.run(SendCommand::new(self.endpoint.clone(), payload))
            .await
    }

    async fn put_batch(&self, payloads: Vec<Bytes>) -> Result<(), QueueError> {
        if payloads.is_empty() {
            debug!(queue = %self.endpoint.queue(), "Skipping empty batch");
            return Ok(());
        }

        let command = BatchSendCommand::new(self.endpoint.clone(), &payloads)?;
        self.run(command).await
    }

    async fn peek(&self) -> Result<Option<QueueMessage>, QueueError> {
        self.run(PeekCommand::new(self.endpoint.clone())).await
    }

    async fn get(&self) -> Result<Option<QueueMessage>, QueueError> {
        self.run(ReceiveCommand::new(self.endpoint.clone())).await
    }

    async fn delete(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.run(DeleteCommand::for_message(self.endpoint.clone(), message))
            .await
    }

    async fn release(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.run(ReleaseCommand::for_message(self.endpoint.clone(), message))
            .await
    }

    async fn renew_lock(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.run(RenewLockCommand::for_message(self.endpoint.clone(), message))
            .await
    }
}

impl<T, A> std::fmt::Debug for AzureServiceBusQueue<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureServiceBusQueue")
            .field("endpoint", &self.endpoint)
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

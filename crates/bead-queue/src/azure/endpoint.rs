//! Queue addressing on a Service Bus namespace.

use url::Url;

use crate::error::ValidationError;
use crate::message::{LockToken, MessageId, Namespace, QueueName};

/// Location of one queue: namespace, queue name and the host serving them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEndpoint {
    namespace: Namespace,
    queue: QueueName,
    base_url: String,
}

impl QueueEndpoint {
    /// Address a queue on the public Azure cloud
    pub fn new(namespace: Namespace, queue: QueueName) -> Self {
        let base_url = format!("https://{}.servicebus.windows.net", namespace.as_str());
        Self {
            namespace,
            queue,
            base_url,
        }
    }

    /// Serve the queue from another scheme and host (emulators, test servers)
    ///
    /// # Errors
    ///
    /// Returns error if `base_url` is not an absolute http(s) URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ValidationError> {
        let parsed = Url::parse(base_url).map_err(|e| ValidationError::InvalidFormat {
            field: "base_url".to_string(),
            message: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidFormat {
                field: "base_url".to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Get namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Get queue name
    pub fn queue(&self) -> &QueueName {
        &self.queue
    }

    /// Root URI of the namespace, the scope of namespace-wide SAS tokens
    pub fn namespace_uri(&self) -> String {
        self.base_url.clone()
    }

    /// URI of the queue entity
    pub fn queue_uri(&self) -> String {
        format!("{}/{}", self.base_url, self.queue.as_str())
    }

    /// `{queue}/messages`, the target of send operations
    pub fn messages_uri(&self) -> String {
        format!("{}/messages", self.queue_uri())
    }

    /// `{queue}/messages/head`, the target of fetch operations
    pub fn head_uri(&self) -> String {
        format!("{}/head", self.messages_uri())
    }

    /// `{queue}/messages/{id}/{lockToken}`, the target of per-message operations
    pub fn message_uri(&self, message_id: &MessageId, lock_token: &LockToken) -> String {
        format!(
            "{}/{}/{}",
            self.messages_uri(),
            urlencoding::encode(message_id.as_str()),
            urlencoding::encode(lock_token.as_str())
        )
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;

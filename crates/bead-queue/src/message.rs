//! Message types for queue operations including core domain identifiers.

use crate::error::ValidationError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue name with length and character restrictions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() || name.len() > 260 {
            return Err(ValidationError::OutOfRange {
                field: "queue_name".to_string(),
                message: "must be 1-260 characters".to_string(),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
        {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "only ASCII alphanumeric, '-', '_', '.' and '/' allowed".to_string(),
            });
        }

        if name.starts_with(['-', '/']) || name.ends_with(['-', '/']) {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "must not start or end with '-' or '/'".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for QueueName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QueueName> for String {
    fn from(value: QueueName) -> Self {
        value.0
    }
}

/// Service Bus namespace, the first label of `{namespace}.servicebus.windows.net`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Create new namespace with validation
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() || name.len() > 50 {
            return Err(ValidationError::OutOfRange {
                field: "namespace".to_string(),
                message: "must be 1-50 characters".to_string(),
            });
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ValidationError::InvalidFormat {
                field: "namespace".to_string(),
                message: "only ASCII alphanumeric and hyphens allowed".to_string(),
            });
        }

        if !name.starts_with(|c: char| c.is_ascii_alphabetic()) || name.ends_with('-') {
            return Err(ValidationError::InvalidFormat {
                field: "namespace".to_string(),
                message: "must start with a letter and not end with a hyphen".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get namespace as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Namespace {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.0
    }
}

/// Unique identifier for messages within a queue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Create message id from a broker-assigned value
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::Required {
                field: "message_id".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Generate new random message ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get message ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Opaque lock handle granted when a message is fetched non-destructively
///
/// An empty token is legal: the broker omits `LockToken` for destructive reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockToken(String);

impl LockToken {
    /// Wrap a broker-supplied lock token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generate new random lock token
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get lock token as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the broker supplied no token
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for LockToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// A message fetched from a queue
///
/// Carries the opaque payload together with the broker properties that came
/// with it. The lock token is only meaningful until the message is deleted
/// or its lock expires.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    id: MessageId,
    lock_token: LockToken,
    payload: Bytes,
    properties: Map<String, Value>,
}

impl QueueMessage {
    /// Create new message
    pub fn new(id: MessageId, lock_token: LockToken, payload: Bytes) -> Self {
        Self {
            id,
            lock_token,
            payload,
            properties: Map::new(),
        }
    }

    /// Attach the broker properties object
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Build a message from a `BrokerProperties` JSON object and body
    ///
    /// `MessageId` is required and must be a string; `LockToken` defaults to
    /// an empty token when absent.
    pub fn from_broker_properties(
        properties: Map<String, Value>,
        payload: Bytes,
    ) -> Result<Self, ValidationError> {
        let id = match properties.get("MessageId") {
            Some(Value::String(id)) => MessageId::new(id.clone())?,
            Some(_) => {
                return Err(ValidationError::InvalidFormat {
                    field: "MessageId".to_string(),
                    message: "must be a string".to_string(),
                })
            }
            None => {
                return Err(ValidationError::Required {
                    field: "MessageId".to_string(),
                })
            }
        };

        let lock_token = match properties.get("LockToken") {
            Some(Value::String(token)) => LockToken::new(token.clone()),
            Some(Value::Null) | None => LockToken::default(),
            Some(_) => {
                return Err(ValidationError::InvalidFormat {
                    field: "LockToken".to_string(),
                    message: "must be a string".to_string(),
                })
            }
        };

        Ok(Self {
            id,
            lock_token,
            payload,
            properties,
        })
    }

    /// Get message id
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Get lock token
    pub fn lock_token(&self) -> &LockToken {
        &self.lock_token
    }

    /// Get payload
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the message, keeping only the payload
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Get all broker properties
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Look up a property by name
    ///
    /// `id` and `lockToken` resolve to the message id and lock token; any
    /// other name is looked up in the broker properties.
    pub fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.as_str().to_string())),
            "lockToken" => Some(Value::String(self.lock_token.as_str().to_string())),
            other => self.properties.get(other).cloned(),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

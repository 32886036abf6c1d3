//! Service Bus REST commands.
//!
//! Each command is an immutable value that knows its method, URI, headers
//! and body, and how to turn the broker's response into a typed result.
//! Commands never talk to the network themselves; see
//! [`super::transport::execute`].

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use super::endpoint::QueueEndpoint;
use crate::error::{QueueError, SerializationError};
use crate::message::{LockToken, MessageId, QueueMessage};

/// Response header carrying message metadata on fetch operations
pub const BROKER_PROPERTIES_HEADER: &str = "BrokerProperties";

/// Content type required by the batch send operation
pub const BATCH_CONTENT_TYPE: &str = "application/vnd.microsoft.servicebus.json";

// ============================================================================
// Request / Response
// ============================================================================

/// HTTP verbs used by the Service Bus REST surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Get the method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully described HTTP request, ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

/// Broker response as seen by command parsers
///
/// Header names are matched case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    status: u16,
    reason: String,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl RestResponse {
    /// Create a response with a status code and reason phrase
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Get status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get reason phrase
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Look up a header by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// Command trait
// ============================================================================

/// One Service Bus operation
pub trait RestCommand: Send + Sync {
    /// Typed result of a successful response
    type Output;

    /// Short verb used in logs and errors ("peek", "delete", ...)
    fn operation(&self) -> &'static str;

    /// Queue the command addresses
    fn endpoint(&self) -> &QueueEndpoint;

    /// HTTP method
    fn method(&self) -> HttpMethod;

    /// Fully qualified request URI
    fn uri(&self) -> String;

    /// Extra request headers
    fn headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Request body
    fn body(&self) -> Bytes {
        Bytes::new()
    }

    /// Classify the response and extract the result
    fn parse_response(&self, response: RestResponse) -> Result<Self::Output, QueueError>;

    /// Snapshot the command as a transport request
    fn request(&self) -> RestRequest {
        RestRequest {
            method: self.method(),
            uri: self.uri(),
            headers: self.headers(),
            body: self.body(),
        }
    }
}

// ============================================================================
// Response classification helpers
// ============================================================================

fn operation_failed(endpoint: &QueueEndpoint, operation: &str, response: &RestResponse) -> QueueError {
    warn!(
        operation,
        queue = %endpoint.queue(),
        namespace = %endpoint.namespace(),
        status = response.status(),
        reason = %response.reason(),
        "Service Bus operation failed"
    );

    QueueError::OperationFailed {
        operation: operation.to_string(),
        queue: endpoint.queue().to_string(),
        namespace: endpoint.namespace().to_string(),
        status: response.status(),
        reason: response.reason().to_string(),
    }
}

fn expect_success(
    endpoint: &QueueEndpoint,
    operation: &str,
    response: &RestResponse,
) -> Result<(), QueueError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(operation_failed(endpoint, operation, response))
    }
}

fn expect_message_success(
    endpoint: &QueueEndpoint,
    operation: &str,
    message_id: &MessageId,
    response: &RestResponse,
) -> Result<(), QueueError> {
    if response.is_success() {
        return Ok(());
    }

    warn!(
        operation,
        message_id = %message_id,
        queue = %endpoint.queue(),
        namespace = %endpoint.namespace(),
        status = response.status(),
        reason = %response.reason(),
        "Service Bus message operation failed"
    );

    Err(QueueError::MessageOperationFailed {
        operation: operation.to_string(),
        message_id: message_id.to_string(),
        queue: endpoint.queue().to_string(),
        namespace: endpoint.namespace().to_string(),
        status: response.status(),
        reason: response.reason().to_string(),
    })
}

/// Shared parser for peek and receive
///
/// 200/201 carry a message, 204 means the queue is empty, anything else is
/// an error.
fn parse_fetch(
    endpoint: &QueueEndpoint,
    operation: &str,
    response: RestResponse,
) -> Result<Option<QueueMessage>, QueueError> {
    match response.status() {
        204 => Ok(None),
        200 | 201 => {
            let raw = response.header(BROKER_PROPERTIES_HEADER).ok_or_else(|| {
                QueueError::MissingHeader {
                    queue: endpoint.queue().to_string(),
                    namespace: endpoint.namespace().to_string(),
                    header: BROKER_PROPERTIES_HEADER.to_string(),
                }
            })?;

            let invalid = |message: String| QueueError::InvalidBrokerProperties {
                queue: endpoint.queue().to_string(),
                namespace: endpoint.namespace().to_string(),
                message,
            };

            let properties: Map<String, Value> = match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => return Err(invalid("expected a JSON object".to_string())),
                Err(e) => return Err(invalid(e.to_string())),
            };

            let message = QueueMessage::from_broker_properties(properties, response.body().clone())
                .map_err(|e| invalid(e.to_string()))?;

            Ok(Some(message))
        }
        _ => Err(operation_failed(endpoint, operation, &response)),
    }
}

// ============================================================================
// Fetch commands
// ============================================================================

/// Lock the message at the head of the queue without removing it
#[derive(Debug, Clone)]
pub struct PeekCommand {
    endpoint: QueueEndpoint,
}

impl PeekCommand {
    pub fn new(endpoint: QueueEndpoint) -> Self {
        Self { endpoint }
    }
}

impl RestCommand for PeekCommand {
    type Output = Option<QueueMessage>;

    fn operation(&self) -> &'static str {
        "peek"
    }

    fn endpoint(&self) -> &QueueEndpoint {
        &self.endpoint
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn uri(&self) -> String {
        self.endpoint.head_uri()
    }

    fn parse_response(&self, response: RestResponse) -> Result<Self::Output, QueueError> {
        parse_fetch(&self.endpoint, self.operation(), response)
    }
}

/// Remove and return the message at the head of the queue
#[derive(Debug, Clone)]
pub struct ReceiveCommand {
    endpoint: QueueEndpoint,
}

impl ReceiveCommand {
    pub fn new(endpoint: QueueEndpoint) -> Self {
        Self { endpoint }
    }
}

impl RestCommand for ReceiveCommand {
    type Output = Option<QueueMessage>;

    fn operation(&self) -> &'static str {
        "receive"
    }

    fn endpoint(&self) -> &QueueEndpoint {
        &self.endpoint
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Delete
    }

    fn uri(&self) -> String {
        self.endpoint.head_uri()
    }

    fn parse_response(&self, response: RestResponse) -> Result<Self::Output, QueueError> {
        parse_fetch(&self.endpoint, self.operation(), response)
    }
}

// ============================================================================
// Send commands
// ============================================================================

/// Append one message to the queue
#[derive(Debug, Clone)]
pub struct SendCommand {
    endpoint: QueueEndpoint,
    payload: Bytes,
}

/// The queue contract calls sending "put"
pub type PutCommand = SendCommand;

impl SendCommand {
    pub fn new(endpoint: QueueEndpoint, payload: impl Into<Bytes>) -> Self {
        Self {
            endpoint,
            payload: payload.into(),
        }
    }
}

impl RestCommand for SendCommand {
    type Output = ();

    fn operation(&self) -> &'static str {
        "send"
    }

    fn endpoint(&self) -> &QueueEndpoint {
        &self.endpoint
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn uri(&self) -> String {
        self.endpoint.messages_uri()
    }

    fn body(&self) -> Bytes {
        self.payload.clone()
    }

    fn parse_response(&self, response: RestResponse) -> Result<Self::Output, QueueError> {
        expect_success(&self.endpoint, self.operation(), &response)
    }
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    #[serde(rename = "Body")]
    body: &'a str,
}

/// Append several messages in one request
#[derive(Debug, Clone)]
pub struct BatchSendCommand {
    endpoint: QueueEndpoint,
    body: Bytes,
    count: usize,
}

impl BatchSendCommand {
    /// Build the batch body, one `{"Body": ...}` entry per payload in input order
    ///
    /// # Errors
    ///
    /// Returns error if a payload is not valid UTF-8; the batch format only
    /// carries string bodies.
    pub fn new(endpoint: QueueEndpoint, payloads: &[Bytes]) -> Result<Self, SerializationError> {
        let entries = payloads
            .iter()
            .enumerate()
            .map(|(index, payload)| {
                std::str::from_utf8(payload)
                    .map(|body| BatchEntry { body })
                    .map_err(|_| SerializationError::InvalidUtf8 { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let body = serde_json::to_vec(&entries)?;

        Ok(Self {
            endpoint,
            body: Bytes::from(body),
            count: payloads.len(),
        })
    }

    /// Number of messages in the batch
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check whether the batch carries no messages
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl RestCommand for BatchSendCommand {
    type Output = ();

    fn operation(&self) -> &'static str {
        "send batch"
    }

    fn endpoint(&self) -> &QueueEndpoint {
        &self.endpoint
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn uri(&self) -> String {
        self.endpoint.messages_uri()
    }

    fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), BATCH_CONTENT_TYPE.to_string());
        headers
    }

    fn body(&self) -> Bytes {
        self.body.clone()
    }

    fn parse_response(&self, response: RestResponse) -> Result<Self::Output, QueueError> {
        expect_success(&self.endpoint, self.operation(), &response)
    }
}

// ============================================================================
// Per-message commands
// ============================================================================

macro_rules! message_command {
    ($(#[$doc:meta])* $name:ident, $operation:literal, $method:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            endpoint: QueueEndpoint,
            message_id: MessageId,
            lock_token: LockToken,
        }

        impl $name {
            pub fn new(endpoint: QueueEndpoint, message_id: MessageId, lock_token: LockToken) -> Self {
                Self {
                    endpoint,
                    message_id,
                    lock_token,
                }
            }

            /// Build the command for a fetched message
            pub fn for_message(endpoint: QueueEndpoint, message: &QueueMessage) -> Self {
                Self::new(endpoint, message.id().clone(), message.lock_token().clone())
            }

            /// Get the message id
            pub fn message_id(&self) -> &MessageId {
                &self.message_id
            }

            /// Get the lock token
            pub fn lock_token(&self) -> &LockToken {
                &self.lock_token
            }
        }

        impl RestCommand for $name {
            type Output = ();

            fn operation(&self) -> &'static str {
                $operation
            }

            fn endpoint(&self) -> &QueueEndpoint {
                &self.endpoint
            }

            fn method(&self) -> HttpMethod {
                $method
            }

            fn uri(&self) -> String {
                self.endpoint.message_uri(&self.message_id, &self.lock_token)
            }

            fn parse_response(&self, response: RestResponse) -> Result<Self::Output, QueueError> {
                expect_message_success(&self.endpoint, self.operation(), &self.message_id, &response)
            }
        }
    };
}

message_command!(
    /// Remove a locked message from the queue
    DeleteCommand,
    "delete",
    HttpMethod::Delete
);

message_command!(
    /// Give up the lock so other consumers can receive the message
    ReleaseCommand,
    "release",
    HttpMethod::Put
);

message_command!(
    /// Extend the lock on a peeked message
    RenewLockCommand,
    "renew lock on",
    HttpMethod::Post
);

message_command!(
    /// Unlock a peeked message
    UnlockCommand,
    "unlock",
    HttpMethod::Put
);

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

//! Error types for queue operations.

use thiserror::Error;

/// Comprehensive error type for all queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    /// The broker answered a queue-level request with an unexpected status.
    #[error(
        "Queue '{queue}' in namespace '{namespace}' failed to {operation}: {status} {reason}"
    )]
    OperationFailed {
        operation: String,
        queue: String,
        namespace: String,
        status: u16,
        reason: String,
    },

    /// The broker answered a request addressing a single message with an unexpected status.
    #[error(
        "Failed to {operation} message '{message_id}' in queue '{queue}' of namespace '{namespace}': {status} {reason}"
    )]
    MessageOperationFailed {
        operation: String,
        message_id: String,
        queue: String,
        namespace: String,
        status: u16,
        reason: String,
    },

    #[error("Response from queue '{queue}' in namespace '{namespace}' is missing the '{header}' header")]
    MissingHeader {
        queue: String,
        namespace: String,
        header: String,
    },

    #[error("Invalid BrokerProperties from queue '{queue}' in namespace '{namespace}': {message}")]
    InvalidBrokerProperties {
        queue: String,
        namespace: String,
        message: String,
    },

    #[error("Transport failure talking to queue '{queue}' in namespace '{namespace}': {source}")]
    Transport {
        queue: String,
        namespace: String,
        #[source]
        source: TransportError,
    },

    #[error("Message '{message_id}' not found in queue '{queue}'")]
    MessageNotFound { queue: String, message_id: String },

    #[error("Lock on message '{message_id}' in queue '{queue}' is lost or expired")]
    LockLost { queue: String, message_id: String },

    #[error("Authorisation failed: {0}")]
    Authorisation(#[from] AuthorisationError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl QueueError {
    /// Check if error is transient and the caller may retry
    ///
    /// Nothing in this crate retries on its own; the classification exists so
    /// callers can pick a policy.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::OperationFailed { status, .. } | Self::MessageOperationFailed { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            Self::MissingHeader { .. } => false,
            Self::InvalidBrokerProperties { .. } => false,
            Self::Transport { source, .. } => source.is_transient(),
            Self::MessageNotFound { .. } => false,
            Self::LockLost { .. } => false,
            Self::Authorisation(e) => e.is_transient(),
            Self::Serialization(_) => false,
            Self::Configuration(_) => false,
            Self::Validation(_) => false,
        }
    }

    /// HTTP status reported by the broker, when the error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::OperationFailed { status, .. } | Self::MessageOperationFailed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Network-level failures raised by a REST transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Connection failed: {message}")]
    Connect { message: String },

    #[error("HTTP request failed: {message}")]
    Request { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl TransportError {
    /// Check if error is transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Connect { .. } => true,
            Self::Request { .. } => true,
            Self::InvalidRequest { .. } => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                message: e.to_string(),
            }
        } else if e.is_connect() {
            Self::Connect {
                message: e.to_string(),
            }
        } else if e.is_builder() {
            Self::InvalidRequest {
                message: e.to_string(),
            }
        } else {
            Self::Request {
                message: e.to_string(),
            }
        }
    }
}

/// Errors raised while acquiring an authorisation credential
///
/// Kept apart from [`QueueError`] so callers can decide whether to
/// re-authenticate or give up.
#[derive(Debug, Error)]
pub enum AuthorisationError {
    #[error("Credentials rejected by {authority}: {status} {message}")]
    Rejected {
        authority: String,
        status: u16,
        message: String,
    },

    #[error("Authority {authority} returned {status}: {message}")]
    ServiceError {
        authority: String,
        status: u16,
        message: String,
    },

    #[error("Network error during token acquisition: {0}")]
    Network(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("Invalid authorisation configuration: {0}")]
    Configuration(String),
}

impl AuthorisationError {
    /// Check if error is transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Rejected { .. } => false,
            Self::ServiceError { .. } => true,
            Self::Network(_) => true,
            Self::InvalidResponse(_) => false,
            Self::Configuration(_) => false,
        }
    }
}

/// Errors during message serialization/deserialization
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Message body at index {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {message}")]
    Parsing { message: String },
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(e: config::ConfigError) -> Self {
        match e {
            config::ConfigError::NotFound(key) => Self::Missing { key },
            other => Self::Parsing {
                message: other.to_string(),
            },
        }
    }
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

//! # Bead Queue
//!
//! Queue abstractions for Bead with an Azure Service Bus REST client and an
//! in-memory implementation.
//!
//! This library provides:
//! - The provider-agnostic [`Queue`] contract (put, peek, get, delete, release)
//! - Azure Service Bus REST commands with exact URI addressing
//! - OAuth2 client-credential and Shared Access Signature authorisation
//! - An in-memory queue with lock tokens for tests and local development
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for queue, transport and authorisation failures
//! - [`message`] - Queue names, message ids, lock tokens and messages
//! - [`queue`] - The `Queue` trait
//! - [`auth`] - Authorisation credentials and authorisers
//! - [`azure`] - Service Bus REST commands, transport and queue
//! - [`memory`] - In-memory queue
//! - [`config`] - Service Bus configuration loading

pub mod auth;
pub mod azure;
pub mod config;
pub mod error;
pub mod memory;
pub mod message;
pub mod queue;

// Re-export commonly used types at crate root for convenience
pub use auth::{
    Authorisation, Authoriser, ClientCredentials, Credential, GrantType, OAuth2Authoriser,
    OAuth2Token, SasAuthoriser, SasToken, Secret,
};
pub use azure::{AzureServiceBusQueue, HttpTransport, QueueEndpoint, RestTransport};
pub use config::{ServiceBusAuthConfig, ServiceBusConfig};
pub use error::{
    AuthorisationError, ConfigurationError, QueueError, SerializationError, TransportError,
    ValidationError,
};
pub use memory::InMemoryQueue;
pub use message::{LockToken, MessageId, Namespace, QueueMessage, QueueName};
pub use queue::Queue;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

//! Authorisation credentials for Service Bus REST calls.
//!
//! This module provides:
//! - The [`Authorisation`] trait: expiry check plus the headers to attach
//! - Concrete credentials: [`OAuth2Token`] and [`SasToken`], unified by [`Credential`]
//! - The [`Authoriser`] trait and its two implementations
//!
//! Credentials are immutable. Refreshing means calling `authorise` again and
//! replacing the old value; nothing in this module refreshes on its own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::AuthorisationError;

pub mod oauth2;
pub mod sas;

pub use oauth2::{
    ClientCredentials, GrantType, OAuth2Authoriser, OAuth2Token, DEFAULT_AUTHORITY,
    SERVICE_BUS_RESOURCE,
};
pub use sas::{SasAuthoriser, SasToken};

/// Header carrying the credential on every REST request
pub const AUTHORIZATION_HEADER: &str = "Authorization";

// ============================================================================
// Secret
// ============================================================================

/// Secret string that is wiped from memory on drop and never printed
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Get the secret (only for immediate use)
    pub fn expose_secret(&self) -> &str {
        self.0.as_str()
    }

    /// Check if secret is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> serde::Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

// ============================================================================
// Authorisation
// ============================================================================

/// A credential that can authenticate REST requests
pub trait Authorisation: Send + Sync {
    /// Check expiry against an explicit instant
    fn has_expired_at(&self, now: DateTime<Utc>) -> bool;

    /// Check if the credential can no longer be used
    fn has_expired(&self) -> bool {
        self.has_expired_at(Utc::now())
    }

    /// Headers to attach to each request
    ///
    /// The header set is stable for a given credential type.
    fn headers(&self) -> HashMap<String, String>;
}

/// Any credential this crate can produce
#[derive(Debug, Clone)]
pub enum Credential {
    OAuth2(OAuth2Token),
    Sas(SasToken),
}

impl Authorisation for Credential {
    fn has_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::OAuth2(token) => token.has_expired_at(now),
            Self::Sas(token) => token.has_expired_at(now),
        }
    }

    fn headers(&self) -> HashMap<String, String> {
        match self {
            Self::OAuth2(token) => token.headers(),
            Self::Sas(token) => token.headers(),
        }
    }
}

impl From<OAuth2Token> for Credential {
    fn from(token: OAuth2Token) -> Self {
        Self::OAuth2(token)
    }
}

impl From<SasToken> for Credential {
    fn from(token: SasToken) -> Self {
        Self::Sas(token)
    }
}

/// Source of credentials for a resource
#[async_trait]
pub trait Authoriser: Send + Sync {
    /// Acquire a fresh credential for the resource
    async fn authorise(&self, resource: &str) -> Result<Credential, AuthorisationError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

//! Shared Access Signature authorisation.
//!
//! A SAS token signs `{url-encoded resource}\n{expiry}` with HMAC-SHA256
//! using a shared access key and presents the result in the `Authorization`
//! header:
//!
//! ```text
//! SharedAccessSignature sr={resource}&sig={signature}&se={expiry}&skn={key name}
//! ```

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;

use super::{Authorisation, Authoriser, Credential, Secret, AUTHORIZATION_HEADER};
use crate::error::AuthorisationError;

type HmacSha256 = Hmac<Sha256>;

/// Default lifetime of tokens minted by [`SasAuthoriser`]
pub const DEFAULT_SAS_TTL_SECONDS: i64 = 3600;

/// Shared Access Signature token for one resource
///
/// The signature is computed once when the token is created.
#[derive(Clone)]
pub struct SasToken {
    service: String,
    key_name: String,
    expiry: DateTime<Utc>,
    header: Secret,
}

impl SasToken {
    /// Sign a new token
    ///
    /// # Arguments
    ///
    /// * `service` - Resource URI the token grants access to
    /// * `key_name` - Name of the shared access policy
    /// * `key` - Shared access key of the policy
    /// * `expiry` - Instant after which the signature is refused
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the key cannot initialise the MAC.
    pub fn new(
        service: impl Into<String>,
        key_name: impl Into<String>,
        key: impl Into<Secret>,
        expiry: DateTime<Utc>,
    ) -> Result<Self, AuthorisationError> {
        let service = service.into();
        let key_name = key_name.into();
        let header = sign(&service, &key_name, &key.into(), expiry)?;

        Ok(Self {
            service,
            key_name,
            expiry,
            header,
        })
    }

    /// Get the resource URI
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Get the policy name
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Get the expiry instant
    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// Signature header value
    pub fn signature(&self) -> &str {
        self.header.expose_secret()
    }
}

fn sign(
    service: &str,
    key_name: &str,
    key: &Secret,
    expiry: DateTime<Utc>,
) -> Result<Secret, AuthorisationError> {
    let encoded_service = urlencoding::encode(service);
    let expiry = expiry.timestamp();
    let string_to_sign = format!("{}\n{}", encoded_service, expiry);

    let mut mac = HmacSha256::new_from_slice(key.expose_secret().as_bytes()).map_err(|e| {
        AuthorisationError::Configuration(format!("Invalid shared access key: {}", e))
    })?;
    mac.update(string_to_sign.as_bytes());
    let signature = general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    Ok(Secret::new(format!(
        "SharedAccessSignature sr={}&sig={}&se={}&skn={}",
        encoded_service,
        urlencoding::encode(&signature),
        expiry,
        urlencoding::encode(key_name)
    )))
}

impl Authorisation for SasToken {
    fn has_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }

    fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(AUTHORIZATION_HEADER.to_string(), self.signature().to_string());
        headers
    }
}

impl fmt::Debug for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SasToken")
            .field("service", &self.service)
            .field("key_name", &self.key_name)
            .field("expiry", &self.expiry)
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

/// Mints SAS tokens from a shared access policy
#[derive(Debug, Clone)]
pub struct SasAuthoriser {
    key_name: String,
    key: Secret,
    ttl: Duration,
}

impl SasAuthoriser {
    /// Create an authoriser minting tokens valid for one hour
    pub fn new(key_name: impl Into<String>, key: impl Into<Secret>) -> Self {
        Self {
            key_name: key_name.into(),
            key: key.into(),
            ttl: Duration::seconds(DEFAULT_SAS_TTL_SECONDS),
        }
    }

    /// Change the lifetime of minted tokens
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Get the token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `resource` valid from `now`
    pub fn token_at(
        &self,
        resource: &str,
        now: DateTime<Utc>,
    ) -> Result<SasToken, AuthorisationError> {
        SasToken::new(resource, self.key_name.clone(), self.key.clone(), now + self.ttl)
    }
}

#[async_trait]
impl Authoriser for SasAuthoriser {
    async fn authorise(&self, resource: &str) -> Result<Credential, AuthorisationError> {
        if self.key_name.is_empty() || self.key.is_empty() {
            return Err(AuthorisationError::Configuration(
                "Key name and key required for shared access signatures".to_string(),
            ));
        }

        if self.ttl <= Duration::zero() {
            return Err(AuthorisationError::Configuration(
                "Shared access signature lifetime must be positive".to_string(),
            ));
        }

        Ok(Credential::Sas(self.token_at(resource, Utc::now())?))
    }
}

#[cfg(test)]
#[path = "sas_tests.rs"]
mod tests;

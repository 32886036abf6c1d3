//! Configuration loading and the Service Bus queue section.
//!
//! Sources are applied in order, later ones overriding earlier ones:
//!
//! 1. `/etc/bead/bead.{toml,json}` - system-wide defaults (optional)
//! 2. `./config/bead.{toml,json}` - deployment-local override (optional)
//! 3. An explicit file, e.g. from `--config` (required when given)
//! 4. Environment variables prefixed `BEAD__`, with `__` between keys,
//!    e.g. `BEAD__QUEUE__NAMESPACE=my-namespace`

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::auth::{
    Authoriser, ClientCredentials, Credential, OAuth2Authoriser, SasAuthoriser, Secret,
    SERVICE_BUS_RESOURCE,
};
use crate::azure::{AzureServiceBusQueue, HttpTransport, QueueEndpoint};
use crate::error::{AuthorisationError, ConfigurationError, QueueError};
use crate::message::{Namespace, QueueName};

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "BEAD";

/// System-wide configuration file, without extension
pub const SYSTEM_CONFIG_PATH: &str = "/etc/bead/bead";

/// Deployment-local configuration file, without extension
pub const LOCAL_CONFIG_PATH: &str = "config/bead";

// ============================================================================
// Layered loading
// ============================================================================

/// Builds a configuration value from files and the environment
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    default_paths: Vec<PathBuf>,
    explicit_path: Option<PathBuf>,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Loader using the standard file locations and environment prefix
    pub fn new() -> Self {
        Self {
            default_paths: vec![
                PathBuf::from(SYSTEM_CONFIG_PATH),
                PathBuf::from(LOCAL_CONFIG_PATH),
            ],
            explicit_path: None,
            env_prefix: Some(ENV_PREFIX.to_string()),
        }
    }

    /// Loader with no sources at all
    pub fn empty() -> Self {
        Self {
            default_paths: Vec::new(),
            explicit_path: None,
            env_prefix: None,
        }
    }

    /// Add a file that must exist
    pub fn with_explicit_path(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read environment variables with another prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Ignore the environment
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Merge every source and deserialize the result
    ///
    /// # Errors
    ///
    /// Returns error if the explicit file is missing, any file is malformed,
    /// or the merged values do not fit `T`.
    pub fn load<T: DeserializeOwned>(&self) -> Result<T, ConfigurationError> {
        let mut builder = config::Config::builder();

        for path in &self.default_paths {
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        }

        if let Some(path) = &self.explicit_path {
            debug!(path = %path.display(), "Loading configuration from explicit path");
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let merged = builder.build()?;
        Ok(merged.try_deserialize()?)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Service Bus section
// ============================================================================

/// Connection settings for one Service Bus queue
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceBusConfig {
    pub namespace: String,
    pub queue: String,

    /// Scheme and host to use instead of `https://{namespace}.servicebus.windows.net`
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    pub auth: ServiceBusAuthConfig,
}

fn default_timeout_seconds() -> u64 {
    30
}

/// How requests to the queue are authorised
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServiceBusAuthConfig {
    /// Azure AD client-credentials flow
    #[serde(rename = "oauth2")]
    OAuth2 {
        tenant_id: String,
        client_id: String,
        client_secret: Secret,
        #[serde(default)]
        resource: Option<String>,
        #[serde(default)]
        authority: Option<String>,
    },

    /// Shared access policy key
    Sas {
        key_name: String,
        key: Secret,
        #[serde(default)]
        ttl_seconds: Option<i64>,
    },
}

impl ServiceBusConfig {
    /// Check names, timeout and credentials
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.endpoint()?;

        if self.timeout_seconds == 0 {
            return Err(invalid("timeout_seconds must be greater than zero"));
        }

        match &self.auth {
            ServiceBusAuthConfig::OAuth2 {
                tenant_id,
                client_id,
                client_secret,
                ..
            } => {
                if tenant_id.is_empty() || client_id.is_empty() || client_secret.is_empty() {
                    return Err(invalid(
                        "oauth2 auth requires tenant_id, client_id and client_secret",
                    ));
                }
            }
            ServiceBusAuthConfig::Sas {
                key_name,
                key,
                ttl_seconds,
            } => {
                if key_name.is_empty() || key.is_empty() {
                    return Err(invalid("sas auth requires key_name and key"));
                }
                if matches!(ttl_seconds, Some(ttl) if *ttl <= 0) {
                    return Err(invalid("sas ttl_seconds must be greater than zero"));
                }
            }
        }

        Ok(())
    }

    /// Queue address described by this section
    pub fn endpoint(&self) -> Result<QueueEndpoint, ConfigurationError> {
        let namespace = Namespace::new(self.namespace.as_str())
            .map_err(|e| invalid(&format!("namespace: {}", e)))?;
        let queue =
            QueueName::new(self.queue.as_str()).map_err(|e| invalid(&format!("queue: {}", e)))?;

        let endpoint = QueueEndpoint::new(namespace, queue);
        match &self.base_url {
            Some(base_url) => endpoint
                .with_base_url(base_url)
                .map_err(|e| invalid(&e.to_string())),
            None => Ok(endpoint),
        }
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Resource the credential is requested for
    ///
    /// OAuth2 tokens are issued for the Service Bus audience; SAS tokens are
    /// scoped to the queue URI.
    pub fn resource(&self, endpoint: &QueueEndpoint) -> String {
        match &self.auth {
            ServiceBusAuthConfig::OAuth2 { resource, .. } => resource
                .clone()
                .unwrap_or_else(|| SERVICE_BUS_RESOURCE.to_string()),
            ServiceBusAuthConfig::Sas { .. } => endpoint.queue_uri(),
        }
    }

    /// Create the configured authoriser
    pub fn authoriser(&self) -> ServiceBusAuthoriser {
        match &self.auth {
            ServiceBusAuthConfig::OAuth2 {
                tenant_id,
                client_id,
                client_secret,
                authority,
                ..
            } => {
                let credentials =
                    ClientCredentials::new(tenant_id.as_str(), client_id.as_str(), client_secret.clone());
                let mut authoriser = OAuth2Authoriser::new(credentials);
                if let Some(authority) = authority {
                    authoriser = authoriser.with_authority(authority.as_str());
                }
                ServiceBusAuthoriser::OAuth2(authoriser)
            }
            ServiceBusAuthConfig::Sas {
                key_name,
                key,
                ttl_seconds,
            } => {
                let mut authoriser = SasAuthoriser::new(key_name.as_str(), key.clone());
                if let Some(ttl) = ttl_seconds {
                    authoriser = authoriser.with_ttl(chrono::Duration::seconds(*ttl));
                }
                ServiceBusAuthoriser::Sas(authoriser)
            }
        }
    }

    /// Validate and assemble a queue client over HTTP
    pub fn build(
        &self,
    ) -> Result<AzureServiceBusQueue<HttpTransport, ServiceBusAuthoriser>, QueueError> {
        self.validate()?;

        let endpoint = self.endpoint()?;
        let resource = self.resource(&endpoint);
        let transport = HttpTransport::with_timeout(self.timeout())
            .map_err(|e| invalid(&e.to_string()))?;

        Ok(AzureServiceBusQueue::new(endpoint, transport, self.authoriser()).with_resource(resource))
    }
}

fn invalid(message: &str) -> ConfigurationError {
    ConfigurationError::Invalid {
        message: message.to_string(),
    }
}

/// Authoriser chosen by configuration
#[derive(Debug, Clone)]
pub enum ServiceBusAuthoriser {
    OAuth2(OAuth2Authoriser),
    Sas(SasAuthoriser),
}

#[async_trait]
impl Authoriser for ServiceBusAuthoriser {
    async fn authorise(&self, resource: &str) -> Result<Credential, AuthorisationError> {
        match self {
            Self::OAuth2(authoriser) => authoriser.authorise(resource).await,
            Self::Sas(authoriser) => authoriser.authorise(resource).await,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

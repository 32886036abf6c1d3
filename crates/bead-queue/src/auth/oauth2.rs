//! OAuth2 client-credential authorisation against Azure Active Directory.
//!
//! Tokens are requested from the v1 token endpoint,
//! `{authority}/{tenant_id}/oauth2/token`, with a form body carrying the
//! grant type, client id, client secret and resource. The endpoint reports
//! `not_before` and `expires_on` as epoch seconds, sometimes as strings.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use super::{Authorisation, Authoriser, Credential, Secret, AUTHORIZATION_HEADER};
use crate::error::AuthorisationError;

/// Default Azure AD authority host
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Resource identifier for Service Bus data-plane tokens
pub const SERVICE_BUS_RESOURCE: &str = "https://servicebus.azure.net";

// ============================================================================
// Token
// ============================================================================

/// Bearer access token issued by an OAuth2 authority
#[derive(Clone)]
pub struct OAuth2Token {
    token: Secret,
    token_type: String,
    not_before: DateTime<Utc>,
    expires_on: DateTime<Utc>,
    resource: String,
}

impl OAuth2Token {
    /// Create a new token
    pub fn new(
        token: impl Into<Secret>,
        token_type: impl Into<String>,
        not_before: DateTime<Utc>,
        expires_on: DateTime<Utc>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            token_type: token_type.into(),
            not_before,
            expires_on,
            resource: resource.into(),
        }
    }

    /// Get the raw token (only for immediate use)
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Get the token type, usually `Bearer`
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Get the instant before which the token is not valid
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// Get the instant the token expires
    pub fn expires_on(&self) -> DateTime<Utc> {
        self.expires_on
    }

    /// Get the resource the token was issued for
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl Authorisation for OAuth2Token {
    fn has_expired_at(&self, now: DateTime<Utc>) -> bool {
        now < self.not_before || now >= self.expires_on
    }

    fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            AUTHORIZATION_HEADER.to_string(),
            format!("{} {}", self.token_type, self.token.expose_secret()),
        );
        headers
    }
}

impl fmt::Debug for OAuth2Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Token")
            .field("token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("not_before", &self.not_before)
            .field("expires_on", &self.expires_on)
            .field("resource", &self.resource)
            .finish()
    }
}

// ============================================================================
// Credentials and grant
// ============================================================================

/// Client application credentials registered with the tenant
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub secret: Secret,
}

impl ClientCredentials {
    /// Create new client credentials
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        secret: impl Into<Secret>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            secret: secret.into(),
        }
    }

    fn validate(&self) -> Result<(), AuthorisationError> {
        if self.tenant_id.is_empty() || self.client_id.is_empty() || self.secret.is_empty() {
            return Err(AuthorisationError::Configuration(
                "Tenant ID, Client ID, and Client Secret required for client credentials"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// OAuth2 grant type sent to the token endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantType {
    ClientCredentials,
    Custom(String),
}

impl GrantType {
    /// Wire value of the grant type
    pub fn as_str(&self) -> &str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::Custom(value) => value,
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Token endpoint wire types
// ============================================================================

/// Epoch seconds, sent either as a JSON number or a numeric string
#[derive(Deserialize)]
#[serde(untagged)]
enum EpochSeconds {
    Number(i64),
    Text(String),
}

impl EpochSeconds {
    fn to_datetime(&self, field: &str) -> Result<DateTime<Utc>, AuthorisationError> {
        let seconds = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                AuthorisationError::InvalidResponse(format!("{} is not epoch seconds: {}", field, s))
            })?,
        };

        Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
            AuthorisationError::InvalidResponse(format!("{} is out of range: {}", field, seconds))
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    not_before: Option<EpochSeconds>,
    expires_on: EpochSeconds,
    resource: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

// ============================================================================
// Authoriser
// ============================================================================

/// Acquires OAuth2 access tokens from an Azure AD authority
#[derive(Clone)]
pub struct OAuth2Authoriser {
    http_client: reqwest::Client,
    authority: String,
    credentials: ClientCredentials,
    grant_type: GrantType,
}

impl OAuth2Authoriser {
    /// Create an authoriser using the client-credentials grant against the default authority
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            authority: DEFAULT_AUTHORITY.to_string(),
            credentials,
            grant_type: GrantType::ClientCredentials,
        }
    }

    /// Use a different authority host (sovereign clouds, test servers)
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a different grant type
    pub fn with_grant_type(mut self, grant_type: GrantType) -> Self {
        self.grant_type = grant_type;
        self
    }

    /// Use a preconfigured HTTP client
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Get the authority host
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Token endpoint for a tenant
    pub fn token_endpoint(&self, tenant_id: &str) -> String {
        format!("{}/{}/oauth2/token", self.authority, tenant_id)
    }

    /// Request a token for `resource` with explicit grant and credentials
    ///
    /// # Errors
    ///
    /// - `Rejected` when the authority answers 4xx
    /// - `ServiceError` when it answers 5xx or anything else unexpected
    /// - `Network` when the request cannot be completed
    /// - `InvalidResponse` when the success body cannot be parsed
    pub async fn request_token(
        &self,
        resource: &str,
        grant_type: &GrantType,
        credentials: &ClientCredentials,
    ) -> Result<OAuth2Token, AuthorisationError> {
        credentials.validate()?;

        let endpoint = self.token_endpoint(&credentials.tenant_id);
        debug!(
            authority = %self.authority,
            tenant_id = %credentials.tenant_id,
            client_id = %credentials.client_id,
            grant_type = %grant_type,
            resource = %resource,
            "Requesting OAuth2 access token"
        );

        let form = [
            ("grant_type", grant_type.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.secret.expose_secret()),
            ("resource", resource),
        ];

        let response = self
            .http_client
            .post(&endpoint)
            .form(&form[..])
            .send()
            .await
            .map_err(|e| AuthorisationError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthorisationError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = Self::describe_error(&body, status.canonical_reason());
            warn!(
                authority = %self.authority,
                status = status.as_u16(),
                message = %message,
                "OAuth2 token request failed"
            );

            return Err(if status.is_client_error() {
                AuthorisationError::Rejected {
                    authority: self.authority.clone(),
                    status: status.as_u16(),
                    message,
                }
            } else {
                AuthorisationError::ServiceError {
                    authority: self.authority.clone(),
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthorisationError::InvalidResponse(e.to_string()))?;

        let expires_on = parsed.expires_on.to_datetime("expires_on")?;
        let not_before = match parsed.not_before {
            Some(value) => value.to_datetime("not_before")?,
            None => Utc::now(),
        };

        Ok(OAuth2Token::new(
            parsed.access_token,
            parsed.token_type,
            not_before,
            expires_on,
            parsed.resource.unwrap_or_else(|| resource.to_string()),
        ))
    }

    fn describe_error(body: &str, reason: Option<&str>) -> String {
        match serde_json::from_str::<TokenErrorResponse>(body) {
            Ok(TokenErrorResponse {
                error_description: Some(description),
                ..
            }) => description,
            Ok(TokenErrorResponse {
                error: Some(error), ..
            }) => error,
            _ => reason.unwrap_or("Unknown").to_string(),
        }
    }
}

impl fmt::Debug for OAuth2Authoriser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Authoriser")
            .field("authority", &self.authority)
            .field("tenant_id", &self.credentials.tenant_id)
            .field("client_id", &self.credentials.client_id)
            .field("grant_type", &self.grant_type)
            .finish()
    }
}

#[async_trait]
impl Authoriser for OAuth2Authoriser {
    async fn authorise(&self, resource: &str) -> Result<Credential, AuthorisationError> {
        let token = self
            .request_token(resource, &self.grant_type, &self.credentials)
            .await?;
        Ok(Credential::OAuth2(token))
    }
}

#[cfg(test)]
#[path = "oauth2_tests.rs"]
mod tests;

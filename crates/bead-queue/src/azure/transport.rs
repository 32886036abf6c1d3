//! HTTP transport for Service Bus REST commands.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use super::commands::{RestCommand, RestRequest, RestResponse};
use crate::auth::Authorisation;
use crate::error::{QueueError, TransportError};

/// Default request timeout applied by [`HttpTransport::new`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends REST requests on behalf of commands
///
/// Implementations add the credential's headers, then the request's own
/// headers, and hand back the raw response. Status codes are never
/// interpreted here; that is the command's job.
#[async_trait]
pub trait RestTransport: Send + Sync {
    async fn send(
        &self,
        request: RestRequest,
        authorisation: &dyn Authorisation,
    ) -> Result<RestResponse, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the default timeout
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bead-queue/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::InvalidRequest {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RestTransport for HttpTransport {
    #[instrument(skip(self, request, authorisation), fields(method = %request.method, uri = %request.uri))]
    async fn send(
        &self,
        request: RestRequest,
        authorisation: &dyn Authorisation,
    ) -> Result<RestResponse, TransportError> {
        let mut builder = self.client.request(request.method.into(), &request.uri);

        for (name, value) in authorisation.headers() {
            builder = builder.header(name, value);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(request.body).send().await?;

        let status = response.status();
        let mut rest_response = RestResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
        );

        for (name, value) in response.headers() {
            // Headers that are not visible ASCII cannot be broker metadata
            if let Ok(value) = value.to_str() {
                rest_response = rest_response.with_header(name.as_str(), value);
            }
        }

        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Received response");

        Ok(rest_response.with_body(body))
    }
}

/// Send a command and parse its response
///
/// Transport failures are reported with the command's queue and namespace.
/// No retries are attempted.
pub async fn execute<C, T>(
    transport: &T,
    command: &C,
    authorisation: &dyn Authorisation,
) -> Result<C::Output, QueueError>
where
    C: RestCommand,
    T: RestTransport + ?Sized,
{
    let endpoint = command.endpoint();
    debug!(
        operation = command.operation(),
        queue = %endpoint.queue(),
        namespace = %endpoint.namespace(),
        "Executing Service Bus command"
    );

    let response = transport
        .send(command.request(), authorisation)
        .await
        .map_err(|source| QueueError::Transport {
            queue: endpoint.queue().to_string(),
            namespace: endpoint.namespace().to_string(),
            source,
        })?;

    command.parse_response(response)
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

//! HTTP client for making requests to vendor APIs

use crate::config::OutgoingSettings;
use crate::providers::{ProviderError, ProviderRequest, ProviderResponse};
use anyhow::Result;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper shared by every vendor provider
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .user_agent(settings.user_agent.clone())
            .gzip(true)
            .brotli(true);

        if let Some(ref proxy_url) = settings.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
        })
    }

    /// Execute a provider request
    pub async fn execute(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.execute_with_timeout(request, self.default_timeout).await
    }

    /// Execute a provider request with custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: ProviderRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, ProviderError> {
        let mut req_builder = self
            .client
            .get(&request.url)
            .timeout(timeout)
            .header("Accept", "application/json");

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        debug!("GET {}", request.url);

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::timed_out(timeout)
            } else {
                ProviderError::Unavailable(format!("request failed: {}", e))
            }
        })?;

        Self::parse_response(response).await
    }

    /// Parse response into ProviderResponse
    async fn parse_response(response: Response) -> Result<ProviderResponse, ProviderError> {
        let status = response.status().as_u16();

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("failed to read body: {}", e)))?;

        Ok(ProviderResponse { status, text })
    }
}

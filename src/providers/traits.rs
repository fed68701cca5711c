//! Provider traits and types

use crate::place::{GeoPoint, Place, PlaceSource};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Failure of a live provider during a call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Backend down, timed out or refusing us; retry later
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The backend rejected the query itself
    #[error("bad request: {0}")]
    BadRequest(String),
    /// A specific place id could not be resolved
    #[error("place not found: {0}")]
    NotFound(String),
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
        }
    }

    pub fn timed_out(after: Duration) -> Self {
        Self::Unavailable(format!("timed out after {:?}", after))
    }
}

/// Parameters handed to a provider for one search call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    /// Free-text query
    pub query: String,
    /// Maximum number of places to return (always >= 1)
    pub limit: usize,
    /// Optional ranking bias
    pub location: Option<GeoPoint>,
}

impl RequestParams {
    pub fn new(query: impl Into<String>, limit: usize) -> Self {
        Self {
            query: query.into(),
            limit: limit.max(1),
            location: None,
        }
    }

    pub fn with_location(mut self, location: Option<GeoPoint>) -> Self {
        self.location = location;
        self
    }
}

/// HTTP GET request to be made against a vendor API
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// Query parameters, in insertion order
    pub params: Vec<(String, String)>,
}

impl ProviderRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Look up a query parameter
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response from a vendor API
#[derive(Debug)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl ProviderResponse {
    /// Parse response as JSON; an unreadable body means the backend misbehaved
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProviderError> {
        serde_json::from_str(&self.text)
            .map_err(|e| ProviderError::Unavailable(format!("malformed response: {}", e)))
    }

    /// Map a non-2xx status on a text search
    pub fn ensure_search_success(&self) -> Result<(), ProviderError> {
        match self.status {
            s if (200..300).contains(&s) => Ok(()),
            400 | 404 | 422 => Err(ProviderError::BadRequest(format!("HTTP {}", self.status))),
            s => Err(ProviderError::Unavailable(format!("HTTP {}", s))),
        }
    }

    /// Map a non-2xx status on a details lookup
    pub fn ensure_details_success(&self, place_id: &str) -> Result<(), ProviderError> {
        match self.status {
            404 => Err(ProviderError::NotFound(place_id.to_string())),
            _ => self.ensure_search_success(),
        }
    }
}

/// Provider metadata
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderAbout {
    /// Website URL
    pub website: Option<String>,
    /// Whether an API key is required
    pub require_api_key: bool,
    /// Whether a location bias changes ranking
    pub supports_location_bias: bool,
}

impl ProviderAbout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn api_key_required(mut self, required: bool) -> Self {
        self.require_api_key = required;
        self
    }

    pub fn location_bias(mut self, supported: bool) -> Self {
        self.supports_location_bias = supported;
        self
    }
}

/// Capability every place-search backend implements
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Source tag this provider answers for
    fn source(&self) -> PlaceSource;

    /// Display name used in logs and messages
    fn name(&self) -> &str {
        self.source().display_name()
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::default()
    }

    /// Upper bound for a single call
    fn timeout(&self) -> Duration {
        Duration::from_secs(crate::DEFAULT_TIMEOUT)
    }

    /// Text search returning at most `params.limit` places
    async fn search(&self, params: &RequestParams) -> Result<Vec<Place>, ProviderError>;

    /// Resolve one place by id within this provider's namespace
    async fn get_place_details(&self, place_id: &str) -> Result<Place, ProviderError>;
}

/// Providers that can take places written back into them.
///
/// Only the local index implements this.
#[async_trait]
pub trait PersistentProvider: Send + Sync {
    /// Upsert a place keyed by `(source, place_id)`
    async fn save_place(&self, place: &Place) -> Result<(), ProviderError>;
}

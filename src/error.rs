//! Error taxonomy shared by the search core and the web boundary

use crate::place::PlaceSource;
use crate::providers::ProviderError;
use thiserror::Error;

/// Malformed caller input, rejected before any provider is invoked
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} parameter is required")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("invalid {field}: {value:?} is not a number")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{0} must be a finite number")]
    NonFiniteCoordinate(&'static str),
    #[error("{field} {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("latitude and longitude must be supplied together")]
    IncompleteLocation,
    #[error("limit must be a positive integer, got {0}")]
    InvalidLimit(i64),
    #[error("Invalid provider {0:?}. Must be one of: local, mapbox, google, all")]
    UnknownProvider(String),
    #[error("Invalid source {0:?}. Must be one of: local, mapbox, google")]
    UnknownSource(String),
}

/// Errors surfaced by the suggestion and details operations
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{} search provider is not available", .0.display_name())]
    ProviderUnavailable(PlaceSource),

    #[error("{} search failed: {error}", .provider.display_name())]
    Provider {
        provider: PlaceSource,
        #[source]
        error: ProviderError,
    },

    #[error("Place not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Lift a provider failure, promoting misses to `NotFound`
    pub fn from_provider(provider: PlaceSource, error: ProviderError) -> Self {
        match error {
            ProviderError::NotFound(id) => Self::NotFound(id),
            error => Self::Provider { provider, error },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Search requests, validated queries and output projections

use crate::error::ValidationError;
use crate::place::{AttributeValue, GeoPoint, Place, PlaceSource};
use crate::providers::RequestParams;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

/// Which backend(s) a suggestion query goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchTarget {
    /// Exactly one provider, invoked directly
    Provider(PlaceSource),
    /// Every configured provider through the orchestrator
    #[default]
    All,
}

impl FromStr for SearchTarget {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<PlaceSource>()
            .map(Self::Provider)
            .map_err(|_| ValidationError::UnknownProvider(s.to_string()))
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(source) => write!(f, "{}", source),
            Self::All => f.write_str("all"),
        }
    }
}

/// Raw suggestion query as received from a caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionRequest {
    pub query: Option<String>,
    pub limit: Option<String>,
    pub provider: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl SuggestionRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: impl ToString) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_location(mut self, latitude: impl ToString, longitude: impl ToString) -> Self {
        self.latitude = Some(latitude.to_string());
        self.longitude = Some(longitude.to_string());
        self
    }

    /// Validate into a query; `limit` is capped at `max_limit`
    pub fn validate(&self, default_limit: usize, max_limit: usize) -> Result<PlaceQuery, ValidationError> {
        let query = present(&self.query)
            .ok_or(ValidationError::Missing("query"))?
            .to_string();

        let limit = match present(&self.limit) {
            Some(raw) => parse_limit(raw)?,
            None => default_limit,
        };

        let target = match present(&self.provider) {
            Some(raw) => raw.parse()?,
            None => SearchTarget::All,
        };

        let latitude = parse_coordinate("latitude", &self.latitude)?;
        let longitude = parse_coordinate("longitude", &self.longitude)?;
        let location = GeoPoint::from_parts(latitude, longitude)?;

        Ok(PlaceQuery {
            query,
            limit: limit.clamp(1, max_limit.max(1)),
            target,
            location,
        })
    }
}

/// Trimmed, non-empty value of an optional parameter
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Positive limit; integers too large for `i64` still count as huge limits
fn parse_limit(raw: &str) -> Result<usize, ValidationError> {
    let limit = match raw.parse::<i64>() {
        Ok(limit) => limit,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => return Ok(usize::MAX),
            IntErrorKind::NegOverflow => i64::MIN,
            _ => {
                return Err(ValidationError::InvalidNumber {
                    field: "limit",
                    value: raw.to_string(),
                })
            }
        },
    };
    if limit < 1 {
        return Err(ValidationError::InvalidLimit(limit));
    }
    Ok(usize::try_from(limit).unwrap_or(usize::MAX))
}

fn parse_coordinate(field: &'static str, raw: &Option<String>) -> Result<Option<f64>, ValidationError> {
    present(raw)
        .map(|v| {
            v.parse::<f64>().map_err(|_| ValidationError::InvalidNumber {
                field,
                value: v.to_string(),
            })
        })
        .transpose()
}

/// A validated suggestion query
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceQuery {
    pub query: String,
    pub limit: usize,
    pub target: SearchTarget,
    pub location: Option<GeoPoint>,
}

impl PlaceQuery {
    /// Parameters handed to each provider
    pub fn params(&self) -> RequestParams {
        RequestParams::new(self.query.clone(), self.limit).with_location(self.location)
    }
}

/// Raw place-details query as received from a caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsRequest {
    pub place_id: Option<String>,
    pub source: Option<String>,
}

impl DetailsRequest {
    pub fn new(place_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            place_id: Some(place_id.into()),
            source: Some(source.into()),
        }
    }

    pub fn validate(&self) -> Result<PlaceLookup, ValidationError> {
        let place_id = present(&self.place_id).ok_or(ValidationError::Missing("place_id"))?;
        let source = present(&self.source).ok_or(ValidationError::Missing("source"))?;

        Ok(PlaceLookup {
            source: source.parse()?,
            place_id: place_id.to_string(),
        })
    }
}

/// A validated place-details query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceLookup {
    pub source: PlaceSource,
    pub place_id: String,
}

/// Coordinates as rendered to callers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Minimal projection of a place for suggestion lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    pub address: String,
    pub source: PlaceSource,
    pub location: Location,
}

impl From<Place> for Suggestion {
    fn from(place: Place) -> Self {
        Self {
            location: Location {
                latitude: place.latitude,
                longitude: place.longitude,
            },
            id: place.place_id,
            name: place.name,
            address: place.address,
            source: place.source,
        }
    }
}

/// Full projection of a place, including provider-specific data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceDetails {
    pub id: String,
    pub name: String,
    pub address: String,
    pub location: Location,
    pub source: PlaceSource,
    pub additional_data: BTreeMap<String, AttributeValue>,
}

impl From<Place> for PlaceDetails {
    fn from(place: Place) -> Self {
        Self {
            location: Location {
                latitude: place.latitude,
                longitude: place.longitude,
            },
            id: place.place_id,
            name: place.name,
            address: place.address,
            source: place.source,
            additional_data: place.additional_data,
        }
    }
}

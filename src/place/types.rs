//! Normalized place types shared by every provider

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Backend a place record originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceSource {
    Local,
    Mapbox,
    Google,
}

impl PlaceSource {
    /// Wire tag (`local`, `mapbox`, `google`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Mapbox => "mapbox",
            Self::Google => "google",
        }
    }

    /// Human readable provider name used in messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Mapbox => "Mapbox",
            Self::Google => "Google Places",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for PlaceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "mapbox" => Ok(Self::Mapbox),
            "google" => Ok(Self::Google),
            _ => Err(ValidationError::UnknownSource(s.to_string())),
        }
    }
}

/// Identity of a place: ids are only unique within their source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceKey {
    pub source: PlaceSource,
    pub place_id: String,
}

impl PlaceKey {
    pub fn new(source: PlaceSource, place_id: impl Into<String>) -> Self {
        Self {
            source,
            place_id: place_id.into(),
        }
    }
}

impl fmt::Display for PlaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.place_id)
    }
}

/// A validated latitude/longitude pair; built only through [`GeoPoint::new`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate("latitude"));
        }
        if !longitude.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate("longitude"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::OutOfRange {
                field: "latitude",
                value: latitude,
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::OutOfRange {
                field: "longitude",
                value: longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build a point from two optional halves; both or neither must be present
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, ValidationError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(ValidationError::IncompleteLocation),
        }
    }
}

/// Provider-specific extra value carried in `additional_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The normalized place record every provider produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: PlaceSource,
    pub additional_data: BTreeMap<String, AttributeValue>,
}

impl Place {
    /// Create a place with no address, location or extra data
    pub fn new(
        place_id: impl Into<String>,
        name: impl Into<String>,
        source: PlaceSource,
    ) -> Result<Self, ValidationError> {
        let place_id = place_id.into();
        let name = name.into();

        if place_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("place_id"));
        }
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }

        Ok(Self {
            place_id,
            name,
            address: String::new(),
            latitude: None,
            longitude: None,
            source,
            additional_data: BTreeMap::new(),
        })
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_location(mut self, point: GeoPoint) -> Self {
        self.latitude = Some(point.latitude);
        self.longitude = Some(point.longitude);
        self
    }

    /// Attach raw coordinates, validating them first
    pub fn with_coordinates(
        self,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Self, ValidationError> {
        Ok(match GeoPoint::from_parts(latitude, longitude)? {
            Some(point) => self.with_location(point),
            None => self,
        })
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.additional_data.insert(key.into(), value.into());
        self
    }

    /// Insert an attribute only when a value is present
    pub fn with_optional_attribute<V: Into<AttributeValue>>(
        self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(v) => self.with_attribute(key, v),
            None => self,
        }
    }

    pub fn key(&self) -> PlaceKey {
        PlaceKey::new(self.source, self.place_id.clone())
    }

    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

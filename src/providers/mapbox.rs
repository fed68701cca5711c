//! Mapbox Search Box provider

use super::traits::*;
use crate::config::VendorSettings;
use crate::network::HttpClient;
use crate::place::{Place, PlaceSource};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Largest `limit` the forward endpoint accepts
const MAX_VENDOR_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Properties,
    geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    mapbox_id: Option<String>,
    name: Option<String>,
    full_address: Option<String>,
    place_formatted: Option<String>,
    address: Option<String>,
    feature_type: Option<String>,
    #[serde(default)]
    poi_category: Vec<String>,
    maki: Option<String>,
    coordinates: Option<Coordinates>,
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    phone: Option<String>,
    website: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[longitude, latitude]`
    #[serde(default)]
    coordinates: Vec<f64>,
}

/// Mapbox place search
pub struct Mapbox {
    client: HttpClient,
    base_url: String,
    access_token: String,
    timeout: Duration,
}

impl Mapbox {
    pub fn new(client: HttpClient, settings: &VendorSettings) -> anyhow::Result<Self> {
        let access_token = settings
            .api_key
            .clone()
            .context("Mapbox access token is not configured")?;
        Url::parse(&settings.base_url)
            .with_context(|| format!("Invalid Mapbox base URL: {}", settings.base_url))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            access_token,
            timeout: Duration::from_secs_f64(settings.timeout),
        })
    }

    /// Build the forward (text search) request
    pub fn search_request(&self, params: &RequestParams) -> ProviderRequest {
        let mut request = ProviderRequest::get(format!("{}/search/searchbox/v1/forward", self.base_url))
            .param("q", params.query.clone())
            .param("limit", params.limit.min(MAX_VENDOR_LIMIT).to_string())
            .param("access_token", self.access_token.clone());

        if let Some(point) = params.location {
            request = request.param(
                "proximity",
                format!("{},{}", point.longitude, point.latitude),
            );
        }

        request
    }

    /// Build the retrieve (details) request
    pub fn details_request(&self, place_id: &str) -> ProviderRequest {
        ProviderRequest::get(format!(
            "{}/search/searchbox/v1/retrieve/{}",
            self.base_url,
            urlencoding::encode(place_id)
        ))
        .param("access_token", self.access_token.clone())
        .param("session_token", uuid::Uuid::new_v4().to_string())
    }

    fn parse_places(&self, response: &ProviderResponse) -> Result<Vec<Place>, ProviderError> {
        let collection: FeatureCollection = response.json()?;
        Ok(collection
            .features
            .into_iter()
            .filter_map(Self::feature_to_place)
            .collect())
    }

    fn feature_to_place(feature: Feature) -> Option<Place> {
        let props = feature.properties;
        let place = Place::new(props.mapbox_id?, props.name?, PlaceSource::Mapbox).ok()?;

        let address = props
            .full_address
            .or(props.place_formatted)
            .or(props.address)
            .unwrap_or_default();

        let (latitude, longitude) = match props.coordinates {
            Some(c) => (c.latitude, c.longitude),
            None => match feature.geometry.as_ref().map(|g| g.coordinates.as_slice()) {
                Some([lon, lat, ..]) => (Some(*lat), Some(*lon)),
                _ => (None, None),
            },
        };

        let categories = (!props.poi_category.is_empty()).then(|| props.poi_category.join(", "));
        let (phone, website) = match props.metadata {
            Some(m) => (m.phone, m.website),
            None => (None, None),
        };

        let place = place
            .with_address(address)
            .with_optional_attribute("feature_type", props.feature_type)
            .with_optional_attribute("categories", categories)
            .with_optional_attribute("maki", props.maki)
            .with_optional_attribute("phone", phone)
            .with_optional_attribute("website", website);

        // vendor coordinates that fail validation are dropped, not the place
        Some(
            place
                .clone()
                .with_coordinates(latitude, longitude)
                .unwrap_or(place),
        )
    }
}

#[async_trait]
impl SearchProvider for Mapbox {
    fn source(&self) -> PlaceSource {
        PlaceSource::Mapbox
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://www.mapbox.com")
            .api_key_required(true)
            .location_bias(true)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip(self), fields(provider = "mapbox"))]
    async fn search(&self, params: &RequestParams) -> Result<Vec<Place>, ProviderError> {
        let request = self.search_request(params);
        let response = self.client.execute_with_timeout(request, self.timeout).await?;
        response.ensure_search_success()?;

        let mut places = self.parse_places(&response)?;
        places.truncate(params.limit);
        debug!("Mapbox returned {} places", places.len());
        Ok(places)
    }

    #[instrument(skip(self), fields(provider = "mapbox"))]
    async fn get_place_details(&self, place_id: &str) -> Result<Place, ProviderError> {
        let request = self.details_request(place_id);
        let response = self.client.execute_with_timeout(request, self.timeout).await?;
        response.ensure_details_success(place_id)?;

        self.parse_places(&response)?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(place_id.to_string()))
    }
}

//! Google Places provider (Places web service JSON API)

use super::traits::*;
use crate::config::VendorSettings;
use crate::network::HttpClient;
use crate::place::{Place, PlaceSource};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const DETAIL_FIELDS: &str = "place_id,name,formatted_address,geometry,rating,user_ratings_total,types,business_status,formatted_phone_number,website";

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: Option<String>,
    name: Option<String>,
    formatted_address: Option<String>,
    geometry: Option<Geometry>,
    rating: Option<f64>,
    user_ratings_total: Option<u64>,
    #[serde(default)]
    types: Vec<String>,
    business_status: Option<String>,
    formatted_phone_number: Option<String>,
    website: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Map an API-level `status` field onto the provider contract
fn check_status(status: &str, message: Option<&str>) -> Result<(), ProviderError> {
    let detail = || match message {
        Some(m) => format!("{}: {}", status, m),
        None => status.to_string(),
    };

    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "NOT_FOUND" => Err(ProviderError::NotFound(detail())),
        "INVALID_REQUEST" => Err(ProviderError::BadRequest(detail())),
        _ => Err(ProviderError::Unavailable(detail())),
    }
}

/// Google Places text search
pub struct GooglePlaces {
    client: HttpClient,
    base_url: String,
    api_key: String,
    timeout: Duration,
    bias_radius_m: u32,
}

impl GooglePlaces {
    pub fn new(client: HttpClient, settings: &VendorSettings) -> anyhow::Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .context("Google Places API key is not configured")?;
        Url::parse(&settings.base_url)
            .with_context(|| format!("Invalid Google Places base URL: {}", settings.base_url))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs_f64(settings.timeout),
            bias_radius_m: settings.bias_radius_m,
        })
    }

    pub fn search_request(&self, params: &RequestParams) -> ProviderRequest {
        let mut request =
            ProviderRequest::get(format!("{}/maps/api/place/textsearch/json", self.base_url))
                .param("query", params.query.clone())
                .param("key", self.api_key.clone());

        if let Some(point) = params.location {
            request = request
                .param("location", format!("{},{}", point.latitude, point.longitude))
                .param("radius", self.bias_radius_m.to_string());
        }

        request
    }

    pub fn details_request(&self, place_id: &str) -> ProviderRequest {
        ProviderRequest::get(format!("{}/maps/api/place/details/json", self.base_url))
            .param("place_id", place_id)
            .param("fields", DETAIL_FIELDS)
            .param("key", self.api_key.clone())
    }

    fn result_to_place(result: PlaceResult) -> Option<Place> {
        let place = Place::new(result.place_id?, result.name?, PlaceSource::Google).ok()?;

        let types = (!result.types.is_empty()).then(|| result.types.join(", "));
        let place = place
            .with_address(result.formatted_address.unwrap_or_default())
            .with_optional_attribute("rating", result.rating)
            .with_optional_attribute("user_ratings_total", result.user_ratings_total)
            .with_optional_attribute("types", types)
            .with_optional_attribute("business_status", result.business_status)
            .with_optional_attribute("phone", result.formatted_phone_number)
            .with_optional_attribute("website", result.website);

        let (latitude, longitude) = match result.geometry.and_then(|g| g.location) {
            Some(LatLng { lat, lng }) => (Some(lat), Some(lng)),
            None => (None, None),
        };

        Some(
            place
                .clone()
                .with_coordinates(latitude, longitude)
                .unwrap_or(place),
        )
    }
}

#[async_trait]
impl SearchProvider for GooglePlaces {
    fn source(&self) -> PlaceSource {
        PlaceSource::Google
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://developers.google.com/maps/documentation/places/web-service")
            .api_key_required(true)
            .location_bias(true)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip(self), fields(provider = "google"))]
    async fn search(&self, params: &RequestParams) -> Result<Vec<Place>, ProviderError> {
        let request = self.search_request(params);
        let response = self.client.execute_with_timeout(request, self.timeout).await?;
        response.ensure_search_success()?;

        let body: TextSearchResponse = response.json()?;
        if let Err(e) = check_status(&body.status, body.error_message.as_deref()) {
            warn!("Google Places text search rejected: {}", e);
            // a text search has no single id to miss
            return Err(match e {
                ProviderError::NotFound(m) => ProviderError::BadRequest(m),
                other => other,
            });
        }

        let places: Vec<Place> = body
            .results
            .into_iter()
            .filter_map(Self::result_to_place)
            .take(params.limit)
            .collect();
        debug!("Google Places returned {} places", places.len());
        Ok(places)
    }

    #[instrument(skip(self), fields(provider = "google"))]
    async fn get_place_details(&self, place_id: &str) -> Result<Place, ProviderError> {
        let request = self.details_request(place_id);
        let response = self.client.execute_with_timeout(request, self.timeout).await?;
        response.ensure_details_success(place_id)?;

        let body: DetailsResponse = response.json()?;
        check_status(&body.status, body.error_message.as_deref()).map_err(|e| match e {
            ProviderError::NotFound(_) => ProviderError::NotFound(place_id.to_string()),
            other => other,
        })?;

        body.result
            .and_then(Self::result_to_place)
            .ok_or_else(|| ProviderError::NotFound(place_id.to_string()))
    }
}

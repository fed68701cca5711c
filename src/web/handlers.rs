//! HTTP request handlers

use super::error::ApiError;
use super::state::AppState;
use crate::metrics::MetricsSnapshot;
use crate::place::PlaceSource;
use crate::providers::ProviderAbout;
use crate::search::{DetailsRequest, PlaceDetails, Suggestion, SuggestionRequest};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Serialize)]
pub struct PlaceDetailsResponse {
    pub place: PlaceDetails,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub version: &'static str,
    pub providers: BTreeMap<PlaceSource, ProviderAbout>,
    pub vendor_order: Vec<PlaceSource>,
    pub metrics: MetricsSnapshot,
}

/// Suggestion handler
pub async fn suggestions(
    State(state): State<AppState>,
    Query(request): Query<SuggestionRequest>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let suggestions = state.service.suggest(&request).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}

/// Place details handler
pub async fn place_details(
    State(state): State<AppState>,
    Query(request): Query<DetailsRequest>,
) -> Result<Json<PlaceDetailsResponse>, ApiError> {
    let place = state.service.place_details(&request).await?;
    Ok(Json(PlaceDetailsResponse { place }))
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let providers = state.service.providers();
    Json(StatsResponse {
        version: crate::VERSION,
        providers: providers
            .ordered()
            .iter()
            .map(|p| (p.source(), p.about()))
            .collect(),
        vendor_order: providers.vendor_order().to_vec(),
        metrics: state.service.metrics().snapshot(),
    })
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Search API
        .route("/search/suggestions", get(handlers::suggestions))
        .route("/search/place-details", get(handlers::place_details))
        // Service routes
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::persistence::PersistenceCache;
    use crate::place::PlaceSource;
    use crate::providers::mock::MockProvider;
    use crate::providers::ProviderSet;
    use crate::search::PlaceService;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router() -> Router {
        let set = ProviderSet::new()
            .with_local(Arc::new(MockProvider::new(PlaceSource::Local)))
            .with_mapbox(Arc::new(MockProvider::new(PlaceSource::Mapbox).with_ids(&["m1", "m2"])))
            .with_google(Arc::new(
                MockProvider::new(PlaceSource::Google).with_ids(&["g1", "g2", "g3"]),
            ));
        let persistence = PersistenceCache::new(set.local_writer(), None);
        let service = PlaceService::new(set, persistence);
        create_router(AppState::new(&Settings::default(), service))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_suggestions() {
        let (status, body) = get_json(router(), "/search/suggestions?query=Coffee&limit=5").await;
        assert_eq!(status, StatusCode::OK);

        let suggestions = body["suggestions"].as_array().unwrap();
        assert_eq!(suggestions.len(), 5);
        assert_eq!(suggestions[0]["id"], "m1");
        assert_eq!(suggestions[0]["source"], "mapbox");
        assert_eq!(suggestions[0]["address"], "m1 Test Street");
        assert!(suggestions[0]["location"].is_object());
        assert_eq!(suggestions[2]["source"], "google");
    }

    #[tokio::test]
    async fn test_configured_default_limit() {
        let set = ProviderSet::new()
            .with_mapbox(Arc::new(MockProvider::new(PlaceSource::Mapbox).with_ids(&["m1", "m2", "m3"])));
        let service = PlaceService::new(set, PersistenceCache::default());
        let mut settings = Settings::default();
        settings.search.default_limit = 2;
        let router = create_router(AppState::new(&settings, service));

        let (status, body) = get_json(router, "/search/suggestions?query=Coffee").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_suggestions_validation() {
        let (status, body) = get_json(router(), "/search/suggestions").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) =
            get_json(router(), "/search/suggestions?query=x&provider=yahoo").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("yahoo"));

        let (status, _) = get_json(router(), "/search/suggestions?query=x&latitude=10").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_provider_unavailable() {
        let service = PlaceService::new(ProviderSet::new(), PersistenceCache::default());
        let router = create_router(AppState::new(&Settings::default(), service));

        let (status, body) =
            get_json(router, "/search/suggestions?query=x&provider=google").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "PROVIDER_UNAVAILABLE");
        assert_eq!(body["error"], "Google Places search provider is not available");
    }

    #[tokio::test]
    async fn test_place_details() {
        let (status, body) =
            get_json(router(), "/search/place-details?place_id=g2&source=google").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["place"]["id"], "g2");
        assert_eq!(body["place"]["name"], "Place g2");
        assert!(body["place"]["additional_data"].is_object());

        let (status, body) =
            get_json(router(), "/search/place-details?place_id=nope&source=google").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = get_json(router(), "/search/place-details?place_id=g2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_and_stats() {
        let (status, body) = get_json(router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = get_json(router(), "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["providers"]["local"].is_object());
        assert_eq!(body["vendor_order"], serde_json::json!(["mapbox", "google"]));
    }
}

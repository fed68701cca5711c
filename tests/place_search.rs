//! End-to-end scenario: vendor lookup, persistence, then local answers

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use place_search::config::Settings;
use place_search::network::HttpClient;
use place_search::persistence::{PersistenceCache, SqlitePlaceStore};
use place_search::providers::ProviderLoader;
use place_search::search::PlaceService;
use place_search::web::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feature(id: &str, name: &str, address: &str) -> Value {
    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [-0.08, 51.52] },
        "properties": {
            "mapbox_id": id,
            "name": name,
            "full_address": address,
            "feature_type": "poi",
            "poi_category": ["coffee"],
            "coordinates": { "latitude": 51.52, "longitude": -0.08 }
        }
    })
}

async fn mapbox_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/searchbox/v1/forward"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "features": [
                feature("poi.7", "Lane Coffee", "7 Lane St, London"),
                feature("poi.8", "Coffee Corner", "8 Corner Rd, London"),
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/searchbox/v1/retrieve/poi.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "features": [feature("poi.7", "Lane Coffee", "7 Lane St, London")]
        })))
        .mount(&server)
        .await;
    server
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_vendor_details_are_served_locally_afterwards() {
    let server = mapbox_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut settings = Settings::default();
    settings.index.dir = dir.path().join("index");
    settings.providers.mapbox.api_key = Some("pk.test".to_string());
    settings.providers.mapbox.base_url = server.uri();
    settings.providers.google.disabled = true;

    let client = HttpClient::new().unwrap();
    let providers = ProviderLoader::load(&settings, &client);

    let url = format!("sqlite://{}", dir.path().join("places.db").display());
    let store = Arc::new(SqlitePlaceStore::connect(&url, 1).await.unwrap());
    let persistence = PersistenceCache::new(providers.local_writer(), Some(store.clone()));
    let service = PlaceService::new(providers, persistence);
    let router = create_router(AppState::new(&settings, service));

    // Nothing indexed yet: suggestions come from the vendor
    let (status, body) = get_json(&router, "/search/suggestions?query=Coffee").await;
    assert_eq!(status, StatusCode::OK);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0]["id"], "poi.7");
    assert_eq!(suggestions[0]["source"], "mapbox");

    let (status, _) =
        get_json(&router, "/search/place-details?place_id=poi.7&source=local").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, vendor) =
        get_json(&router, "/search/place-details?place_id=poi.7&source=mapbox").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vendor["place"]["name"], "Lane Coffee");

    // Persistence runs detached from the response
    let mut local = Value::Null;
    for _ in 0..100 {
        let (status, body) =
            get_json(&router, "/search/place-details?place_id=poi.7&source=local").await;
        if status == StatusCode::OK {
            local = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(local["place"]["name"], vendor["place"]["name"]);
    assert_eq!(local["place"]["address"], vendor["place"]["address"]);
    assert_eq!(local["place"]["location"], vendor["place"]["location"]);
    assert_eq!(local["place"]["source"], "mapbox");

    let (status, body) =
        get_json(&router, "/search/suggestions?query=Lane&provider=local").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"][0]["id"], "poi.7");

    // The store write may land just after the index write
    let mut count = 0;
    for _ in 0..100 {
        count = store.count().await.unwrap();
        if count > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_unconfigured_vendors() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.index.dir = dir.path().to_path_buf();

    let providers = ProviderLoader::load(&settings, &HttpClient::new().unwrap());
    let service = PlaceService::new(providers, PersistenceCache::default());
    let router = create_router(AppState::new(&settings, service));

    let (status, body) = get_json(&router, "/search/suggestions?query=Coffee").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"], json!([]));

    let (status, body) =
        get_json(&router, "/search/place-details?place_id=x&source=mapbox").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "PROVIDER_UNAVAILABLE");
}

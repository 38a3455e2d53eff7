//! Integration tests for the boundary HTTP server.
//!
//! These spin up the real router on an ephemeral port and exercise it with a
//! plain HTTP client. No provider is configured, so every route runs the
//! permissive/no-provider paths; provider behavior itself is covered by unit
//! tests against the adapters.

use std::net::SocketAddr;
use std::sync::Arc;

use address_status::server::{build_router, AppState};
use address_status::{
    AddressValidationService, GeocodingOptions, GeocodingService, LogObserver, MemoryTtlStore,
    ResilienceGuard, ResilienceSettings, TtlStore, ValidationOptions,
};
use serde_json::{json, Value};

const ADMIN_TOKEN: &str = "test-admin-token";

async fn spawn_server(seed_territories: &str) -> SocketAddr {
    let store: Arc<dyn TtlStore> = Arc::new(MemoryTtlStore::new());
    store.set("territories", seed_territories, None);

    let guard = Arc::new(ResilienceGuard::new(
        ResilienceSettings::default(),
        Arc::new(LogObserver),
    ));
    let validation = Arc::new(AddressValidationService::new(
        None,
        Arc::clone(&guard),
        Arc::clone(&store),
        ValidationOptions::default(),
    ));
    let geocoding = Arc::new(GeocodingService::new(
        None,
        guard,
        Arc::clone(&validation),
        store,
        GeocodingOptions::default(),
    ));
    let state = AppState {
        validation,
        geocoding,
        admin_token: Some(Arc::from(ADMIN_TOKEN)),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    addr
}

fn dc_territory() -> String {
    json!([{
        "id": "dc",
        "name": "Pepco DC",
        "utility": "pepco",
        "type": "state",
        "states": ["DC"]
    }])
    .to_string()
}

#[tokio::test]
async fn test_validate_passes_through_without_provider() {
    let addr = spawn_server("[]").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/address/validate", addr))
        .json(&json!({
            "street": "1600 Pennsylvania Ave NW",
            "city": "Washington",
            "state": "DC",
            "zip": "20500"
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["standardized"]["street"], json!("1600 Pennsylvania Ave NW"));
    assert_eq!(body["issues"], json!([]));
}

#[tokio::test]
async fn test_autocomplete_returns_empty_predictions() {
    let addr = spawn_server("[]").await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/address/autocomplete?input=1600+Penn", addr))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["predictions"], json!([]));
}

#[tokio::test]
async fn test_place_details_not_found_without_provider() {
    let addr = spawn_server("[]").await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!(
            "http://{}/address/place-details?place_id=ChIJtest",
            addr
        ))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_geocode_is_404_without_provider() {
    let addr = spawn_server("[]").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/geocode", addr))
        .json(&json!({
            "street": "1600 Pennsylvania Ave NW",
            "city": "Washington",
            "state": "DC",
            "zip": "20500"
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_territory_check_requires_point_or_address() {
    let addr = spawn_server(&dc_territory()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/territory/check", addr))
        .json(&json!({ "utility": "pepco" }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_territory_check_with_coordinates() {
    let addr = spawn_server(&dc_territory()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/territory/check", addr))
        .json(&json!({
            "latitude": 38.90,
            "longitude": -77.02,
            "utility": "pepco"
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["in_territory"], json!(true));
    assert_eq!(body["matching_territories"][0]["id"], json!("dc"));
    assert_eq!(body["latitude"], json!(38.90));

    // Baltimore falls outside the DC-only territory
    let response = client
        .post(format!("http://{}/territory/check", addr))
        .json(&json!({
            "latitude": 39.2904,
            "longitude": -76.6122,
            "utility": "pepco"
        }))
        .send()
        .await
        .expect("request");
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["in_territory"], json!(false));
    assert_eq!(body["matching_territories"], json!([]));
}

#[tokio::test]
async fn test_territory_crud_requires_admin_token() {
    let addr = spawn_server(&dc_territory()).await;
    let client = reqwest::Client::new();

    // Listing without the token is rejected
    let response = client
        .get(format!("http://{}/territories", addr))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 401);

    // With the token the collection is visible
    let response = client
        .get(format!("http://{}/territories", addr))
        .header("x-admin-token", ADMIN_TOKEN)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));
}

#[tokio::test]
async fn test_territory_save_and_delete_roundtrip() {
    let addr = spawn_server("[]").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/territory", addr))
        .header("x-admin-token", ADMIN_TOKEN)
        .json(&json!({
            "name": "Radius Zone",
            "utility": "bge",
            "type": "radius",
            "center": {"latitude": 39.29, "longitude": -76.61},
            "radius_miles": 15.0
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("json body");
    let id = body["id"].as_str().expect("territory id").to_string();

    // The new radius territory matches downtown Baltimore
    let response = client
        .post(format!("http://{}/territory/check", addr))
        .json(&json!({ "latitude": 39.2904, "longitude": -76.6122 }))
        .send()
        .await
        .expect("request");
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["in_territory"], json!(true));

    // Delete it, then deleting again is a 404
    let response = client
        .delete(format!("http://{}/territory/{}", addr, id))
        .header("x-admin-token", ADMIN_TOKEN)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 204);

    let response = client
        .delete(format!("http://{}/territory/{}", addr, id))
        .header("x-admin-token", ADMIN_TOKEN)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_health_reports_no_providers_when_unconfigured() {
    let addr = spawn_server("[]").await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["providers"], json!({}));
}

#[tokio::test]
async fn test_end_to_end_unknown_territory_without_provider() {
    // With no provider there is no geocoding, so an address-only territory
    // check reports unknown rather than denied
    let addr = spawn_server(&dc_territory()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/territory/check", addr))
        .json(&json!({
            "street": "1600 Pennsylvania Ave",
            "city": "Washington",
            "state": "DC",
            "zip": "20500",
            "utility": "pepco"
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["success"], json!(false));
    assert!(body.get("in_territory").is_none() || body["in_territory"].is_null());
    assert_eq!(body["message"], json!("Unable to verify service territory."));
}

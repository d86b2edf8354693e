use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use carecompass_api::{
    error::{AppError, AppResult},
    models::{
        CentrePatch, Coordinates, MergePolicy, NewReview, ReviewSource, RouteOutcome, TargetRef,
        TravelMode,
    },
    routes::{create_router, AppState},
    services::{
        geo, DirectoryWriter, GeocodingProvider, InMemoryDirectory, RecommendationService,
        RoutingProvider,
    },
};

const HOME: Coordinates = Coordinates {
    lat: 1.35,
    lng: 103.80,
};

struct FakeGeocoder;

#[async_trait::async_trait]
impl GeocodingProvider for FakeGeocoder {
    async fn resolve(&self, address: &str) -> AppResult<Option<Coordinates>> {
        match address {
            "560123" => Ok(Some(HOME)),
            "offline" => Err(AppError::ExternalApi("geocoder unreachable".to_string())),
            _ => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Routes along the great circle, failing for the destination at `unreachable_lat`
struct FakeRouter {
    unreachable_lat: Option<f64>,
}

#[async_trait::async_trait]
impl RoutingProvider for FakeRouter {
    async fn route_distance(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
    ) -> AppResult<RouteOutcome> {
        if self.unreachable_lat == Some(destination.lat) {
            return Err(AppError::ExternalApi("router unreachable".to_string()));
        }
        let meters = geo::haversine_meters(origin, destination).round() as u64;
        let speed = match mode {
            TravelMode::Transit => 5,
            _ => 10,
        };
        Ok(RouteOutcome::Found {
            distance_meters: meters,
            duration_seconds: meters / speed,
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

async fn seeded_directory() -> Arc<InMemoryDirectory> {
    let directory = Arc::new(InMemoryDirectory::new());

    for (friendly_id, name, lat) in [
        ("ddc-far", "Far Away Day Care", 1.45),
        ("ddc-near", "Next Door Day Care", 1.36),
        ("ddc-mid", "Midway Day Care", 1.40),
        ("ddc-farther", "Farthest Day Care", 1.50),
    ] {
        directory
            .upsert_centre(
                CentrePatch {
                    friendly_id: friendly_id.to_string(),
                    name: Some(name.to_string()),
                    lat: Some(lat),
                    lng: Some(103.80),
                    ..Default::default()
                },
                MergePolicy::Override,
            )
            .await
            .unwrap();
    }

    for rating in [5, 4] {
        directory
            .upsert_review(NewReview {
                target: TargetRef::DementiaDaycare(2),
                review_source: ReviewSource::InApp,
                overall_rating: rating,
                content: None,
                author_name: "Caregiver".to_string(),
                author_id: None,
                google_review_id: None,
                published_time: None,
            })
            .await
            .unwrap();
    }

    directory
}

async fn create_test_server_with_router(router: FakeRouter) -> TestServer {
    let directory = seeded_directory().await;
    let service = RecommendationService::new(
        directory.clone(),
        directory,
        Arc::new(FakeGeocoder),
        Arc::new(router),
        Duration::from_secs(2),
    );
    let state = Arc::new(AppState::new(service, vec!["http://localhost:3000".to_string()]));
    TestServer::new(create_router(state)).unwrap()
}

async fn create_test_server() -> TestServer {
    create_test_server_with_router(FakeRouter {
        unreachable_lat: None,
    })
    .await
}

fn names(body: &[Value]) -> Vec<&str> {
    body.iter().map(|c| c["name"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_recommendations_without_location_use_directory_order() {
    let server = create_test_server().await;

    let response = server.post("/api/v1/recommendations").json(&json!({})).await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(
        names(&body),
        vec!["Far Away Day Care", "Next Door Day Care", "Midway Day Care"]
    );
    assert!(body.iter().all(|c| c["distanceFromHome"].is_null()));
    assert!(body.iter().all(|c| c.get("drivingRoute").is_none()));
}

#[tokio::test]
async fn test_blank_location_is_treated_as_absent() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/recommendations")
        .add_query_param("limit", 2)
        .json(&json!({ "location": "   " }))
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(names(&body), vec!["Far Away Day Care", "Next Door Day Care"]);
}

#[tokio::test]
async fn test_recommendations_sorted_by_driving_distance() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "location": "560123" }))
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(
        names(&body),
        vec!["Next Door Day Care", "Midway Day Care", "Far Away Day Care"]
    );

    let nearest = &body[0];
    assert_eq!(nearest["friendlyId"], "ddc-near");
    assert_eq!(nearest["reviewCount"], 2);
    assert_eq!(nearest["averageRating"], 4.5);
    assert_eq!(nearest["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(nearest["drivingRoute"]["status"], "found");

    let distance = nearest["distanceFromHome"].as_u64().unwrap();
    assert!((1_000..1_300).contains(&distance));
    assert_eq!(nearest["drivingDuration"].as_u64().unwrap(), distance / 10);
    assert_eq!(nearest["transitDuration"].as_u64().unwrap(), distance / 5);

    let distances: Vec<u64> = body
        .iter()
        .map(|c| c["distanceFromHome"].as_u64().unwrap())
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_limit_caps_the_result_size() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/recommendations")
        .add_query_param("limit", 10)
        .json(&json!({ "location": "560123" }))
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 4);
    assert_eq!(body[3]["name"], "Farthest Day Care");
}

#[tokio::test]
async fn test_router_failure_leaves_distance_unknown_and_last() {
    let server = create_test_server_with_router(FakeRouter {
        unreachable_lat: Some(1.36),
    })
    .await;

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "location": "560123" }))
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(
        names(&body),
        vec!["Midway Day Care", "Far Away Day Care", "Next Door Day Care"]
    );
    assert!(body[0]["distanceFromHome"].is_u64());
    assert!(body[1]["distanceFromHome"].is_u64());
    assert!(body[2]["distanceFromHome"].is_null());
    assert!(body[2]["drivingDuration"].is_null());
    assert_eq!(body[2]["drivingRoute"]["status"], "error");
    assert_eq!(body[2]["reviewCount"], 2);
}

#[tokio::test]
async fn test_unknown_address_is_bad_request() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "location": "nowhere in particular" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("nowhere in particular"));
}

#[tokio::test]
async fn test_geocoder_outage_is_bad_gateway() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "location": "offline" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_zero_limit_is_bad_request() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/recommendations")
        .add_query_param("limit", 0)
        .json(&json!({}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server().await;
    let request_id = "3f2b8c1e-6a4d-4f5e-9b7a-1c2d3e4f5a6b";

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(request_id),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), request_id);
}

#[tokio::test]
async fn test_request_id_generated_when_missing() {
    let server = create_test_server().await;

    let response = server.get("/health").await;

    let header = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(header.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_post_without_body_uses_directory_order() {
    let server = create_test_server().await;

    let response = server.post("/api/v1/recommendations").await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 3);
    assert_eq!(body[0]["name"], "Far Away Day Care");
}

#[tokio::test]
async fn test_non_numeric_limit_is_json_bad_request() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/recommendations")
        .add_query_param("limit", "abc")
        .json(&json!({}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));
}

#[tokio::test]
async fn test_malformed_body_is_json_bad_request() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/recommendations")
        .text("{\"location\": ")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
}

//! API integration tests for lens-server.
//!
//! These tests drive the HTTP API with realistic multipart and JSON
//! requests, backed by in-process upstream mocks so no network is touched.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lens_core::{
    AnalysisCache, AnnotationLocation, HistoricPhoto, LandmarkAnnotation, LatLng, MockDescriber,
    MockImageSearch, MockVision, Orchestrator, OrchestratorConfig, VisionDetections, WebEntity,
    DEFAULT_CACHE_TTL,
};
use lens_server::{create_router, AppState, Config};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "----TestBoundary7MA4YWxkTrZu0gW";

/// Helper to create multipart body for an analyze request
fn create_analyze_multipart(
    field_name: &str,
    content: &[u8],
    content_type: &str,
) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"photo.jpg\"\r\n",
            field_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");

    // End boundary
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

fn colosseum_detections() -> VisionDetections {
    VisionDetections {
        landmarks: vec![LandmarkAnnotation {
            mid: Some("/m/0d5qx".into()),
            description: "Colosseum".into(),
            score: 0.95,
            locations: vec![AnnotationLocation {
                lat_lng: Some(LatLng {
                    latitude: 41.890_2,
                    longitude: 12.492_2,
                }),
            }],
        }],
        web_entities: vec![WebEntity {
            entity_id: Some("/m/0d5qx".into()),
            description: "Colosseum".into(),
            score: 1.1,
        }],
    }
}

fn historic_photo() -> HistoricPhoto {
    HistoricPhoto {
        url: "https://example.org/colosseum_1890.jpg".into(),
        thumbnail_url: "https://example.org/colosseum_1890_thumb.jpg".into(),
        title: "Colosseum, 1890".into(),
        context_link: "https://example.org/archive".into(),
    }
}

/// Build the test router around the given vision mock
fn create_test_app_with(vision: MockVision) -> Router {
    let orchestrator = Orchestrator::new(
        Arc::new(vision),
        Arc::new(MockDescriber::new(Some("Ancient amphitheatre in Rome.".into()))),
        Arc::new(MockImageSearch::new(vec![historic_photo()], Vec::new())),
        AnalysisCache::in_memory(DEFAULT_CACHE_TTL),
        OrchestratorConfig::default(),
    );
    create_router(AppState::new(orchestrator, &Config::default()))
}

fn create_test_app() -> Router {
    create_test_app_with(MockVision::new(colosseum_detections()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn analyze_request(content_type: String, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("Content-Type", content_type)
        .body(Body::from(body))
        .unwrap()
}

fn analyze_image_request(json: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze-image")
        .header("Content-Type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_ping_endpoint_returns_pong() {
    let app = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "pong");
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "lens-server");
    assert!(json["version"].is_string());
    assert_eq!(json["cache_ttl_secs"], DEFAULT_CACHE_TTL.as_secs());
}

#[tokio::test]
async fn test_ready_endpoint_returns_ok() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Detection Proxy Tests
// ============================================================================

#[tokio::test]
async fn test_analyze_image_returns_landmark_annotations() {
    let app = create_test_app();

    let response = app
        .oneshot(analyze_image_request(
            serde_json::json!({ "imageUri": "https://example.org/colosseum.jpg" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let annotations = json.as_array().expect("Response should be an array");
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0]["description"], "Colosseum");
    assert!(annotations[0]["locations"][0]["latLng"]["latitude"].is_number());
}

#[tokio::test]
async fn test_analyze_image_vision_failure_returns_500() {
    let app = create_test_app_with(MockVision::failing("quota exceeded"));

    let response = app
        .oneshot(analyze_image_request(
            serde_json::json!({ "imageUri": "gs://bucket/colosseum.jpg" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert_eq!(json["code"], "ANALYSIS_FAILED");
}

#[tokio::test]
async fn test_analyze_image_rejects_empty_uri() {
    let app = create_test_app();

    let response = app
        .oneshot(analyze_image_request(serde_json::json!({ "imageUri": "  " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_analyze_image_rejects_unsupported_scheme() {
    let app = create_test_app();

    let response = app
        .oneshot(analyze_image_request(
            serde_json::json!({ "imageUri": "file:///etc/passwd" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Analyze Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_analyze_returns_enriched_result() {
    let app = create_test_app();

    let (content_type, body) =
        create_analyze_multipart("file", b"\xFF\xD8\xFF\xE0 colosseum", "image/jpeg");

    let response = app
        .oneshot(analyze_request(content_type, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["origin"], "fresh");
    assert_eq!(json["landmarks"][0]["name"], "Colosseum");
    assert_eq!(json["description"], "Ancient amphitheatre in Rome.");
    assert_eq!(json["historicPhotos"][0]["title"], "Colosseum, 1890");
    assert_eq!(json["lowConfidence"], false);
}

#[tokio::test]
async fn test_analyze_same_image_twice_is_served_from_cache() {
    let app = create_test_app();
    let content = b"\xFF\xD8\xFF\xE0 same bytes";

    let (content_type, body) = create_analyze_multipart("file", content, "image/jpeg");
    let first = app
        .clone()
        .oneshot(analyze_request(content_type, body))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["origin"], "fresh");

    let (content_type, body) = create_analyze_multipart("file", content, "image/jpeg");
    let second = app
        .oneshot(analyze_request(content_type, body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(second["origin"], "cache");
    assert_eq!(second["landmarks"], first["landmarks"]);
}

#[tokio::test]
async fn test_analyze_accepts_photo_larger_than_two_megabytes() {
    let app = create_test_app();

    let mut content = b"\xFF\xD8\xFF\xE0".to_vec();
    content.resize(3 * 1024 * 1024, 0x5A);
    let (content_type, body) = create_analyze_multipart("file", &content, "image/jpeg");

    let response = app
        .oneshot(analyze_request(content_type, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["landmarks"][0]["name"], "Colosseum");
}

#[tokio::test]
async fn test_analyze_rejects_file_over_configured_maximum() {
    let app = create_test_app();

    let mut content = b"\xFF\xD8\xFF\xE0".to_vec();
    content.resize(Config::default().max_file_size + 1, 0x5A);
    let (content_type, body) = create_analyze_multipart("file", &content, "image/jpeg");

    let response = app
        .oneshot(analyze_request(content_type, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_vision_failure_returns_500() {
    let app = create_test_app_with(MockVision::failing("backend unavailable"));

    let (content_type, body) = create_analyze_multipart("file", b"\xFF\xD8 bytes", "image/jpeg");

    let response = app
        .oneshot(analyze_request(content_type, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ANALYSIS_FAILED");
}

#[tokio::test]
async fn test_analyze_rejects_missing_file_field() {
    let app = create_test_app();

    let (content_type, body) = create_analyze_multipart("photo", b"\xFF\xD8 bytes", "image/jpeg");

    let response = app
        .oneshot(analyze_request(content_type, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_analyze_rejects_non_image_content_type() {
    let app = create_test_app();

    let (content_type, body) = create_analyze_multipart("file", b"hello", "text/plain");

    let response = app
        .oneshot(analyze_request(content_type, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_rejects_empty_file() {
    let app = create_test_app();

    let (content_type, body) = create_analyze_multipart("file", b"", "image/jpeg");

    let response = app
        .oneshot(analyze_request(content_type, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

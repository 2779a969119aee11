//! Integration tests for the hosted level store client.
//!
//! Uses wiremock to mock the PostgREST endpoint.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use questpoints::source::{LevelSource, RestLevelStore, load_levels};
use questpoints_core::{FetchError, LevelName, LevelOrigin, default_levels};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn level_rows() -> serde_json::Value {
    json!([
        {"id": "0b6f", "name": "Seeker", "min_points": 0, "max_points": 99, "badge_letter": "S", "color": "#ABCDEF", "user_count": 320},
        {"id": "1c7a", "name": "Explorer", "min_points": 100, "max_points": 499, "badge_letter": "E", "color": "#3B82F6", "user_count": 75},
        {"id": "2d8b", "name": "Achiever", "min_points": 500, "max_points": 1499, "badge_letter": "A", "color": "#10B981", "user_count": 20},
        {"id": "3e9c", "name": "Champion", "min_points": 1500, "max_points": 4999, "badge_letter": "C", "color": "#F59E0B", "user_count": 4},
        {"id": "4fad", "name": "Legend", "min_points": 5000, "max_points": null, "badge_letter": "L", "color": "#8B5CF6", "user_count": 1}
    ])
}

fn store(server: &MockServer) -> RestLevelStore {
    RestLevelStore::new(server.uri(), Some("anon-key"), "levels").unwrap()
}

// =============================================================================
// FETCH TESTS
// =============================================================================

#[tokio::test]
async fn test_fetch_levels_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/levels"))
        .and(query_param("select", "*"))
        .and(query_param("order", "min_points.asc"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(level_rows()))
        .mount(&server)
        .await;

    let levels = store(&server).fetch_levels().await.unwrap();
    assert_eq!(levels.len(), 5);
    assert_eq!(levels[0].name, LevelName::Seeker);
    assert_eq!(levels[0].color, "#ABCDEF");
    assert_eq!(levels[0].user_count, 320);
    assert!(levels[4].is_unbounded());
}

#[tokio::test]
async fn test_fetch_levels_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/levels"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = store(&server).fetch_levels().await;
    match result {
        Err(FetchError::Unavailable(reason)) => assert!(reason.contains("503")),
        other => panic!("Expected Unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_levels_empty_table() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/levels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = store(&server).fetch_levels().await;
    assert_eq!(result, Err(FetchError::Empty));
}

#[tokio::test]
async fn test_fetch_levels_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/levels"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "relation does not exist"})),
        )
        .mount(&server)
        .await;

    let result = store(&server).fetch_levels().await;
    assert!(matches!(result, Err(FetchError::Malformed(_))));
}

#[tokio::test]
async fn test_custom_table_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_levels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(level_rows()))
        .mount(&server)
        .await;

    let store = RestLevelStore::new(server.uri(), None, "user_levels").unwrap();
    assert!(store.fetch_levels().await.is_ok());
}

// =============================================================================
// FALLBACK TESTS
// =============================================================================

#[tokio::test]
async fn test_load_levels_uses_hosted_table() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/levels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(level_rows()))
        .mount(&server)
        .await;

    let resolved = load_levels(&LevelSource::Rest(store(&server))).await;
    assert_eq!(resolved.origin, LevelOrigin::Authoritative);
    assert_eq!(resolved.color("Seeker"), "#ABCDEF");
}

#[tokio::test]
async fn test_load_levels_falls_back_on_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/levels"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let resolved = load_levels(&LevelSource::Rest(store(&server))).await;
    assert_eq!(resolved.origin, LevelOrigin::Fallback);
    assert_eq!(resolved.levels, default_levels());
    assert_eq!(resolved.resolve(0).map(|l| l.name), Some(LevelName::Seeker));
}

#[tokio::test]
async fn test_load_levels_falls_back_when_unreachable() {
    // Nothing listens on the discard port.
    let store = RestLevelStore::new("http://127.0.0.1:9", None, "levels").unwrap();

    let resolved = load_levels(&LevelSource::Rest(store)).await;
    assert!(resolved.is_fallback());
    assert!(resolved.reason.unwrap().contains("unavailable"));
}

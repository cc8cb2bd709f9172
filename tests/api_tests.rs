//! HTTP tests for the EmoRec router.
//!
//! Everything runs offline: no Spotify or Genius credentials, hashing
//! embedder, built-in catalogue.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use emorec::{build_router, AppState, Config};
use serde_json::{json, Value};
use tower::util::ServiceExt;

async fn setup_app() -> Router {
    let config = Config {
        collage_width: 160,
        collage_height: 120,
        ..Config::default()
    };
    let state = AppState::new(&config).await.expect("offline state should build");
    build_router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string()).await
}

async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_root_describes_api() {
    let (status, body) = get(setup_app().await, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "EmoRec API");
    assert!(body["endpoints"]["generate_playlist"].is_string());
}

#[tokio::test]
async fn test_health_endpoints() {
    let (status, body) = get(setup_app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(setup_app().await, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["embedding_service"], true);
    assert_eq!(body["services"]["spotify"], false);
    assert_eq!(body["services"]["genius"], false);
}

#[tokio::test]
async fn test_list_emotions() {
    let (status, body) = get(setup_app().await, "/api/v1/emotions").await;
    assert_eq!(status, StatusCode::OK);

    let emotions = body["emotions"].as_array().unwrap();
    assert_eq!(emotions.len(), 26);
    assert!(emotions.contains(&json!("happy")));
    assert!(body["note"].is_string());
}

#[tokio::test]
async fn test_emotion_features() {
    let (status, body) = get(setup_app().await, "/api/v1/emotions/happy/features").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["valence"].is_array());
    assert!(body["energy"].is_array());
}

#[tokio::test]
async fn test_related_emotions_respects_top_k() {
    let (status, body) = get(setup_app().await, "/api/v1/emotions/happy/related?top_k=4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emotion"], "happy");

    let related = body["related"].as_array().unwrap();
    assert_eq!(related.len(), 4);
    assert!(related.iter().all(|r| r["emotion"] != "happy"));
}

#[tokio::test]
async fn test_analyze_emotions() {
    let (status, body) = post_json(
        setup_app().await,
        "/api/v1/emotions/analyze",
        json!({ "emotions": ["happy", "sad", "sunday morning"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emotions"].as_array().unwrap().len(), 3);
    assert_eq!(body["learned_emotions"], json!(["sunday morning"]));
    assert!(body["is_coherent"].is_boolean());
}

#[tokio::test]
async fn test_analyze_rejects_empty_list() {
    let (status, body) = post_json(
        setup_app().await,
        "/api/v1/emotions/analyze",
        json!({ "emotions": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_generate_playlist_with_collage() {
    let (status, body) = post_json(
        setup_app().await,
        "/api/v1/generate-playlist",
        json!({ "emotion": ["happy"], "num_results": 5, "include_collage": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let playlist = body["playlist"].as_array().unwrap();
    assert_eq!(playlist.len(), 5);
    assert!(playlist.iter().all(|s| s["song_name"].is_string()));

    let collage = &body["mood_collage"];
    assert!(!collage["image_base64"].as_str().unwrap().is_empty());
    assert_eq!(collage["dominant_colors"].as_array().unwrap().len(), 5);
    assert_eq!(collage["width"], 160);

    assert_eq!(body["combined_embedding"].as_array().unwrap().len(), 10);
    assert!(body["emotion_features"].is_object());
}

#[tokio::test]
async fn test_generate_playlist_without_collage() {
    let (status, body) = post_json(
        setup_app().await,
        "/api/v1/generate-playlist",
        json!({ "emotion": "calm", "num_results": 3 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playlist"].as_array().unwrap().len(), 3);
    assert!(body["mood_collage"].is_null());
}

#[tokio::test]
async fn test_generate_playlist_from_seed_songs() {
    let (status, body) = post_json(
        setup_app().await,
        "/api/v1/generate-playlist",
        json!({
            "songs": [{ "song_name": "Imagine", "artist": "John Lennon" }],
            "num_results": 5
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let playlist = body["playlist"].as_array().unwrap();
    assert_eq!(playlist.len(), 5);
    assert!(playlist.iter().all(|s| s["song_name"] != "Imagine"));
}

#[tokio::test]
async fn test_generate_playlist_requires_a_source() {
    let (status, body) = post_json(setup_app().await, "/api/v1/generate-playlist", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("at least one"));
}

#[tokio::test]
async fn test_generate_playlist_rejects_bad_num_results() {
    let (status, _) = post_json(
        setup_app().await,
        "/api/v1/generate-playlist",
        json!({ "emotion": ["happy"], "num_results": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        setup_app().await,
        "/api/v1/generate-playlist",
        json!({ "emotion": ["happy"], "num_results": 51 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_spotify_endpoints_unavailable_without_credentials() {
    for uri in [
        "/api/v1/spotify/search/tracks?q=imagine",
        "/api/v1/spotify/search/artists?q=queen",
        "/api/v1/spotify/tracks/4uLU6hMCjMI75M1A2tKUQC",
        "/api/v1/spotify/artists/1dfeR4HaWDbWqFHLkxsg1d",
        "/api/v1/spotify/artists/1dfeR4HaWDbWqFHLkxsg1d/top-tracks",
    ] {
        let (status, body) = get(setup_app().await, uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
        assert!(body["detail"].is_string());
    }
}

#[tokio::test]
async fn test_spotify_search_requires_query() {
    let (status, _) = get(setup_app().await, "/api/v1/spotify/search/tracks?q=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(setup_app().await, "/api/v1/spotify/search/artists").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_playlist_bodies_use_detail_envelope() {
    for body in [
        json!({ "emotion": ["happy"], "num_results": -1 }),
        json!({ "songs": [{ "song_name": "Imagine" }] }),
        json!({ "emotion": 42 }),
    ] {
        let (status, detail) =
            post_json(setup_app().await, "/api/v1/generate-playlist", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(detail["detail"].is_string(), "{}", body);
    }
}

#[tokio::test]
async fn test_non_json_body_is_bad_request() {
    let (status, body) = post_raw(setup_app().await, "/api/v1/generate-playlist", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, body) = post_raw(setup_app().await, "/api/v1/emotions/analyze", "{").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_bad_query_parameters_are_bad_request() {
    let (status, body) = get(setup_app().await, "/api/v1/emotions/happy/related?top_k=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, body) =
        get(setup_app().await, "/api/v1/spotify/search/tracks?q=imagine&limit=-5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_spotify_lookups_reject_malformed_ids() {
    for uri in [
        "/api/v1/spotify/tracks/..%2Fme",
        "/api/v1/spotify/artists/abc%3Fmarket%3DUS",
        "/api/v1/spotify/artists/..%2F..%2Fme/top-tracks",
    ] {
        let (status, body) = get(setup_app().await, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["detail"].as_str().unwrap().contains("Invalid Spotify ID"), "{}", uri);
    }
}

//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sugar_deck::DEFAULT_DECK_YAML;
use sugar_deck::yaml_word_deck::YamlWordDeck;
use sugar_store::memory_document_store::InMemoryDocumentStore;
use sugar_test_support::{FixedClock, MockRng};
use tower::ServiceExt;

use sugar_api::routes;
use sugar_api::state::AppState;

/// Build app state over a fresh in-memory store and the bundled deck, drawing
/// cards deterministically.
pub fn test_state() -> AppState {
    let store = InMemoryDocumentStore::new(Arc::new(FixedClock::default_instant()));
    let deck = YamlWordDeck::from_yaml_str(DEFAULT_DECK_YAML, Box::new(MockRng)).unwrap();
    AppState::new(Arc::new(store), Arc::new(deck), "tl")
}

/// Build the full app router. Uses the same route structure as `main.rs`.
pub fn build_test_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/rooms", routes::rooms::router())
        .with_state(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

//! Sugar API server entry point.

use std::sync::Arc;

use axum::Router;
use sugar_api::config::Config;
use sugar_api::error::AppError;
use sugar_api::routes;
use sugar_api::state::AppState;
use sugar_core::clock::SystemClock;
use sugar_core::rng::{DeterministicRng, StdDeterministicRng};
use sugar_deck::DEFAULT_DECK_YAML;
use sugar_deck::yaml_word_deck::YamlWordDeck;
use sugar_store::memory_document_store::InMemoryDocumentStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Sugar API server");

    let config = Config::from_env()?;

    let rng: Box<dyn DeterministicRng> = match config.rng_seed {
        Some(seed) => Box::new(StdDeterministicRng::seeded(seed)),
        None => Box::new(StdDeterministicRng::from_entropy()),
    };
    let deck = match &config.word_deck_path {
        Some(path) => YamlWordDeck::from_path(path, rng),
        None => YamlWordDeck::from_yaml_str(DEFAULT_DECK_YAML, rng),
    }
    .map_err(AppError::Deck)?;
    if deck.card_count(&config.default_language) == 0 {
        tracing::warn!(language = %config.default_language, "word deck has no cards for the default language");
    }

    let store = InMemoryDocumentStore::new(Arc::new(SystemClock));
    let app_state = AppState::new(
        Arc::new(store),
        Arc::new(deck),
        config.default_language.clone(),
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/rooms", routes::rooms::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

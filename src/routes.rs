//! HTTP router and shared handler state.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, store::CharacterStore};

/// State shared with every handler via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CharacterStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn CharacterStore>) -> Self {
        Self { store }
    }
}

/// Build the application router.
///
/// # Routes
///
/// - `GET /health`
/// - `GET|POST /api/v1/characters`
/// - `GET|PUT|DELETE /api/v1/characters/{id}`
/// - `POST /api/v1/transfers`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/v1/characters",
            get(handlers::characters::list_characters).post(handlers::characters::create_character),
        )
        .route(
            "/api/v1/characters/{id}",
            get(handlers::characters::get_character)
                .put(handlers::characters::update_character)
                .delete(handlers::characters::delete_character),
        )
        .route(
            "/api/v1/transfers",
            post(handlers::transfers::create_transfer),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

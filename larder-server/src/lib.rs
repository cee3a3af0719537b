//! Larder Server - REST API for ingredient-driven recipe generation

pub mod config;
pub mod error;
pub mod routes;
pub mod stream;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use larder_ai::RecipeGenerator;

pub use config::ServerConfig;
pub use error::ApiError;

/// Application state shared across handlers. Read-only after startup.
pub struct AppState {
    pub generator: RecipeGenerator,
}

impl AppState {
    pub fn new(generator: RecipeGenerator) -> Self {
        Self { generator }
    }
}

/// Build the HTTP router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::status))
        .route("/api/recipe", post(routes::generate_recipe))
        .route("/api/recipe/pdf", post(routes::render_recipe_pdf))
        .route("/api/recipe-pdf", post(routes::generate_recipe_pdf))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

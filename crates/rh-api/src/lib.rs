//! # rh-api
//!
//! The web routing and orchestration layer for RoboHub.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

pub use error::ApiError;
pub use handlers::{ApiPolicy, AppState};
pub use middleware::MiddlewareConfig;

/// Builds the full application router with its middleware stack.
///
/// # Developer Note
/// Everything except the health probe is mounted under `/api`.
pub fn create_router(state: Arc<AppState>, config: MiddlewareConfig) -> Router {
    let api = Router::new()
        .route("/articles", get(handlers::list_articles).post(handlers::create_article))
        .route("/articles/{id}", get(handlers::get_article).put(handlers::update_article))
        .route("/articles/{id}/like", post(handlers::like_article))
        .route("/articles/{id}/view", post(handlers::view_article))
        .route("/articles/{id}/save", post(handlers::save_article))
        .route("/cad-models", get(handlers::list_cad_models).post(handlers::create_cad_model))
        .route("/cad-models/{id}", get(handlers::get_cad_model))
        .route("/cad-models/{id}/like", post(handlers::like_cad_model))
        .route("/cad-models/{id}/view", post(handlers::view_cad_model))
        .route("/cad-models/{id}/save", post(handlers::save_cad_model))
        .route("/categories", get(handlers::list_categories))
        .route("/dashboard", get(handlers::dashboard));

    let router = Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .with_state(state);

    middleware::apply(router, config)
}

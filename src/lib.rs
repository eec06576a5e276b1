pub mod assets;
pub mod catalog;
pub mod concierge;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod genres;
pub mod llm;
pub mod models;
pub mod omdb;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{concierge::Concierge, config::Config};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub concierge: Arc<Concierge>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/ai/recommendations", post(routes::recommend))
        .nest_service("/static/uploads", ServeDir::new(&state.config.uploads_dir))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

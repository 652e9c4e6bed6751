//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/` and `/health` - API info and health checks
//! - `/embeddings` - Create, fetch and delete stored embeddings
//! - `/search`, `/simple-search` - Similarity search
//! - `/upload` - Multipart file upload and indexing
//! - `/stats` - Database statistics
//! - `/demo`, `/setup-demo`, `/widget.js`, `/widget-embed.js` - Demo page and search widget

pub mod demo;
pub mod embeddings;
pub mod files;
pub mod health;
pub mod search;
pub mod static_files;
pub mod stats;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Headroom on top of the file limit for multipart framing and base64 expansion.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let body_limit = state
        .config
        .upload
        .max_file_size
        .max(state.config.embedding.max_image_size * 4 / 3)
        + BODY_LIMIT_SLACK;
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(health::router(state.clone()))
        .merge(embeddings::router(state.clone()))
        .merge(search::router(state.clone()))
        .merge(files::router(state.clone()))
        .merge(stats::router(state.clone()))
        .merge(demo::router(state))
        .merge(static_files::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

// Pany - Self-hosted multi-modal semantic search on PostgreSQL + pgvector

pub mod config;
pub mod db;
pub mod demo;
pub mod embeddings;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}

use axum::{extract::State, routing::get, Json, Router};

use crate::db::is_connected;
use crate::models::{ApiInfo, AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn api_info(State(state): State<AppState>) -> Json<ApiInfo> {
    let server = &state.config.server;

    Json(ApiInfo {
        name: server.api_title.clone(),
        version: server.api_version.clone(),
        description: server.api_description.clone(),
        health_url: "/health".to_string(),
        endpoints: [
            "GET /health",
            "POST /embeddings",
            "GET /embeddings/{content_id}",
            "DELETE /embeddings/{content_id}",
            "POST /search",
            "POST /simple-search",
            "POST /upload",
            "GET /stats",
            "GET /demo",
            "POST /setup-demo",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    })
}

/// Always 200; `status` reports whether both the database and the model are usable.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_connected = is_connected(&state.pool).await;
    let model_loaded = state.embedder.is_ready();

    let status = if database_connected && model_loaded {
        "healthy"
    } else {
        "unhealthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: state.config.server.api_version.clone(),
        database_connected,
        model_loaded,
        timestamp: chrono::Utc::now(),
    })
}

use axum::{extract::State, routing::get, Json, Router};

use crate::db::DatabaseOperations;
use crate::models::{AppState, StatsResponse};
use crate::types::{AppResult, Modality};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(get_stats))
        .with_state(state)
}

async fn get_stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let total_embeddings = DatabaseOperations::count_embeddings(&state.pool).await?;
    let by_modality = DatabaseOperations::count_by_modality(&state.pool).await?;

    Ok(Json(StatsResponse {
        total_embeddings,
        by_modality,
        supported_modalities: Modality::EMBEDDABLE.to_vec(),
        embedding_dimension: state.embedder.dimension(),
        model: state.embedder.model_name().to_string(),
    }))
}

use axum::{extract::State, routing::post, Form, Json, Router};
use tracing::info;
use validator::Validate;

use super::embeddings::input_for;
use crate::embeddings::{EmbeddingInput, SearchOptions, VectorSearch};
use crate::models::{
    AppState, SearchRequest, SearchResponse, SimpleSearchForm, SimpleSearchResponse,
};
use crate::types::{AppResult, Modality};

/// Threshold used by the form-based search behind the widget.
const SIMPLE_SEARCH_THRESHOLD: f64 = 0.5;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", post(search_similar))
        .route("/simple-search", post(simple_search))
        .with_state(state)
}

async fn search_similar(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<SearchResponse>> {
    request.validate()?;
    let query_modality = Modality::parse_embeddable(&request.query_modality)?;
    let target_modality = request
        .target_modality
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(str::parse::<Modality>)
        .transpose()?;

    info!(
        query_modality = %query_modality,
        target_modality = ?target_modality,
        threshold = request.similarity_threshold,
        max_results = request.max_results,
        "Search request received"
    );

    let input = input_for(&state, &request.query, query_modality)?;
    let outcome = VectorSearch::new(&state.pool, state.embedder.as_ref())
        .search(
            &input,
            SearchOptions {
                target_modality,
                similarity_threshold: request.similarity_threshold,
                max_results: request.max_results,
            },
        )
        .await?;

    Ok(Json(SearchResponse {
        query: request.query,
        query_modality,
        total_results: outcome.results.len(),
        results: outcome.results,
        execution_time_ms: outcome.execution_time_ms,
    }))
}

/// Text search across all modalities, fed by an HTML form.
async fn simple_search(
    State(state): State<AppState>,
    Form(form): Form<SimpleSearchForm>,
) -> AppResult<Json<SimpleSearchResponse>> {
    form.validate()?;

    let outcome = VectorSearch::new(&state.pool, state.embedder.as_ref())
        .search(
            &EmbeddingInput::Text(form.query.clone()),
            SearchOptions {
                target_modality: None,
                similarity_threshold: SIMPLE_SEARCH_THRESHOLD,
                max_results: form.max_results,
            },
        )
        .await?;

    Ok(Json(SimpleSearchResponse {
        success: true,
        query: form.query,
        total_results: outcome.results.len(),
        results: outcome.results,
    }))
}

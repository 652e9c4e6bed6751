use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::db::DatabaseOperations;
use crate::embeddings::{image_input::decode_base64_image, EmbeddingInput, VectorSearch};
use crate::models::{AppState, DeleteResponse, EmbeddingRecord, EmbeddingRequest, EmbeddingResponse};
use crate::types::{AppError, AppResult, Modality};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/embeddings", post(create_embedding))
        .route(
            "/embeddings/{content_id}",
            get(get_embedding).delete(delete_embedding),
        )
        .with_state(state)
}

/// Build the encoder input for a JSON payload: plain text, or a base64 image.
pub(crate) fn input_for(
    state: &AppState,
    content: &str,
    modality: Modality,
) -> AppResult<EmbeddingInput> {
    match modality {
        Modality::Text => Ok(EmbeddingInput::Text(content.to_string())),
        Modality::Image => Ok(EmbeddingInput::Image(decode_base64_image(
            content,
            state.config.embedding.max_image_size,
        )?)),
        other => Err(AppError::InvalidRequest(format!(
            "Unsupported modality: {}. Supported: text, image",
            other
        ))),
    }
}

async fn create_embedding(
    State(state): State<AppState>,
    Json(request): Json<EmbeddingRequest>,
) -> AppResult<Json<EmbeddingResponse>> {
    request.validate()?;
    let modality = Modality::parse_embeddable(&request.modality)?;
    info!(content_id = %request.content_id, modality = %modality, "Embedding request received");

    let metadata = match request.metadata {
        Some(Value::Object(map)) => Value::Object(map),
        Some(Value::Null) | None => Value::Object(Default::default()),
        Some(_) => {
            return Err(AppError::InvalidRequest(
                "metadata must be a JSON object".to_string(),
            ))
        }
    };

    let input = input_for(&state, &request.content, modality)?;
    let record = VectorSearch::new(&state.pool, state.embedder.as_ref())
        .index(&request.content_id, &request.content, &input, metadata)
        .await?;

    Ok(Json(EmbeddingResponse {
        content_id: record.content_id,
        modality,
        embedding: record.embedding.to_vec(),
        metadata: record.metadata,
        message: "Embedding generated and stored successfully".to_string(),
    }))
}

async fn get_embedding(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> AppResult<Json<EmbeddingRecord>> {
    DatabaseOperations::get_embedding(&state.pool, &content_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No embedding for content_id {}", content_id)))
}

async fn delete_embedding(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    if !DatabaseOperations::delete_embedding(&state.pool, &content_id).await? {
        return Err(AppError::NotFound(format!(
            "No embedding for content_id {}",
            content_id
        )));
    }

    info!(content_id = %content_id, "Embedding deleted");
    Ok(Json(DeleteResponse {
        deleted: true,
        content_id,
    }))
}

use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::info;

use crate::embeddings::{DocumentProcessor, VectorSearch};
use crate::models::{AppState, UploadResponse};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload_file))
        .with_state(state)
}

struct UploadedFile {
    filename: String,
    data: Bytes,
}

/// Pull the `file` part and an optional `content_id` text part out of the form.
async fn read_upload(
    mut multipart: Multipart,
) -> AppResult<(UploadedFile, Option<String>)> {
    let mut file = None;
    let mut content_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "upload".to_string());
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read uploaded file: {}", e))
                })?;
                file = Some(UploadedFile { filename, data });
            }
            Some("content_id") => {
                let value = field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read content_id: {}", e))
                })?;
                let value = value.trim().to_string();
                if !value.is_empty() {
                    content_id = Some(value);
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| {
        AppError::InvalidRequest("Missing multipart field 'file'".to_string())
    })?;

    Ok((file, content_id))
}

async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let start = Instant::now();
    let (file, content_id) = read_upload(multipart).await?;
    let content_id = content_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!(filename = %file.filename, size = file.data.len(), content_id = %content_id, "File upload request received");

    let processor = DocumentProcessor::new(
        state.config.upload.max_file_size,
        state.config.embedding.max_image_size,
    );
    let filename = file.filename.clone();
    let data = file.data;
    let processed = tokio::task::spawn_blocking(move || processor.process_document(&filename, &data))
        .await
        .map_err(|e| AppError::Internal(format!("File processing task failed: {}", e)))??;

    let modality = processed.modality();
    let record = VectorSearch::new(&state.pool, state.embedder.as_ref())
        .index(
            &content_id,
            &processed.content,
            &processed.input,
            Value::Object(processed.metadata),
        )
        .await?;

    let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(content_id = %record.content_id, "Upload processed in {:.2}ms", processing_time_ms);

    Ok(Json(UploadResponse {
        success: true,
        content_id: record.content_id,
        message: format!("File '{}' processed successfully", file.filename),
        modality,
        processing_time_ms,
    }))
}

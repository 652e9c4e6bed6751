use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use validator::Validate;

use crate::config::Config;
use crate::embeddings::Embedder;
use crate::types::Modality;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub embedder: Arc<dyn Embedder>,
}

// Database rows
// Note: FromRow is needed for runtime query_as (without DATABASE_URL at compile time)

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EmbeddingRecord {
    pub id: uuid::Uuid,
    pub content_id: String,
    pub modality: String,
    pub content: String,
    #[serde(serialize_with = "serialize_vector")]
    pub embedding: pgvector::Vector,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn serialize_vector<S>(vector: &pgvector::Vector, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(vector.as_slice())
}

/// Values written by an insert/upsert. The vector is already normalised.
#[derive(Debug, Clone)]
pub struct NewEmbedding {
    pub content_id: String,
    pub modality: Modality,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchResult {
    pub content_id: String,
    pub modality: String,
    pub content: String,
    pub similarity: f64,
    pub metadata: Value,
}

// API Request/Response types

#[derive(Debug, Deserialize, Validate)]
pub struct EmbeddingRequest {
    #[validate(length(min = 1, max = 255))]
    pub content_id: String,
    pub modality: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub content_id: String,
    pub modality: Modality,
    pub embedding: Vec<f32>,
    pub metadata: Value,
    pub message: String,
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_max_results() -> i64 {
    10
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1))]
    pub query: String,
    pub query_modality: String,
    #[serde(default)]
    pub target_modality: Option<String>,
    #[serde(default = "default_similarity_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub similarity_threshold: f64,
    #[serde(default = "default_max_results")]
    #[validate(range(min = 1, max = 100))]
    pub max_results: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub query_modality: Modality,
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    pub execution_time_ms: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SimpleSearchForm {
    #[validate(length(min = 1))]
    pub query: String,
    #[serde(default = "default_max_results")]
    #[validate(range(min = 1, max = 100))]
    pub max_results: i64,
}

#[derive(Debug, Serialize)]
pub struct SimpleSearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_results: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub content_id: String,
    pub message: String,
    pub modality: Modality,
    pub processing_time_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub content_id: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_embeddings: i64,
    pub by_modality: BTreeMap<String, i64>,
    pub supported_modalities: Vec<Modality>,
    pub embedding_dimension: usize,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct DemoSetupResponse {
    pub success: bool,
    pub message: String,
    pub success_count: usize,
    pub total_products: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub health_url: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database_connected: bool,
    pub model_loaded: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_defaults() {
        let request: SearchRequest =
            serde_json::from_str(r#"{"query": "red dress", "query_modality": "text"}"#).unwrap();
        assert_eq!(request.similarity_threshold, 0.7);
        assert_eq!(request.max_results, 10);
        assert!(request.target_modality.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_search_request_ranges() {
        let request: SearchRequest = serde_json::from_str(
            r#"{"query": "q", "query_modality": "text", "similarity_threshold": 1.5}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());

        let request: SearchRequest = serde_json::from_str(
            r#"{"query": "q", "query_modality": "text", "max_results": 0}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());

        let request: SearchRequest = serde_json::from_str(
            r#"{"query": "q", "query_modality": "text", "max_results": 100, "similarity_threshold": 0.0}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_embedding_request_requires_content_id() {
        let request: EmbeddingRequest = serde_json::from_str(
            r#"{"content_id": "", "modality": "text", "content": "hello"}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_record_serializes_vector_as_list() {
        let record = EmbeddingRecord {
            id: uuid::Uuid::nil(),
            content_id: "doc-1".to_string(),
            modality: "text".to_string(),
            content: "hello".to_string(),
            embedding: pgvector::Vector::from(vec![0.5, 0.25]),
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["embedding"], serde_json::json!([0.5, 0.25]));
    }
}

// Vector search over pgvector: query embedding + nearest-neighbour lookup,
// and the matching write path (embed + upsert)

use std::time::Instant;

use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use super::{Embedder, EmbeddingInput};
use crate::db::{DatabaseOperations, SimilarityQuery};
use crate::models::{EmbeddingRecord, NewEmbedding, SearchResult};
use crate::types::{AppResult, Modality};

pub struct SearchOptions {
    pub target_modality: Option<Modality>,
    pub similarity_threshold: f64,
    pub max_results: i64,
}

pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub execution_time_ms: f64,
}

pub struct VectorSearch<'a> {
    pool: &'a PgPool,
    embedder: &'a dyn Embedder,
}

impl<'a> VectorSearch<'a> {
    pub fn new(pool: &'a PgPool, embedder: &'a dyn Embedder) -> Self {
        Self { pool, embedder }
    }

    pub async fn search(
        &self,
        query: &EmbeddingInput,
        options: SearchOptions,
    ) -> AppResult<SearchOutcome> {
        let start = Instant::now();

        let embedding = self.embedder.embed(query).await?;
        let results = DatabaseOperations::search_similar(
            self.pool,
            &SimilarityQuery {
                embedding,
                target_modality: options.target_modality,
                similarity_threshold: options.similarity_threshold,
                max_results: options.max_results,
            },
        )
        .await?;

        let execution_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            results = results.len(),
            "Search completed in {:.2}ms", execution_time_ms
        );

        Ok(SearchOutcome {
            results,
            execution_time_ms,
        })
    }

    /// Embed `input` and store it under `content_id`, replacing any existing row.
    pub async fn index(
        &self,
        content_id: &str,
        content: &str,
        input: &EmbeddingInput,
        metadata: Value,
    ) -> AppResult<EmbeddingRecord> {
        let start = Instant::now();

        let embedding = self.embedder.embed(input).await?;
        let record = DatabaseOperations::upsert_embedding(
            self.pool,
            &NewEmbedding {
                content_id: content_id.to_string(),
                modality: input.modality(),
                content: content.to_string(),
                embedding,
                metadata,
            },
        )
        .await?;

        info!(
            content_id,
            modality = %input.modality(),
            "Created embedding in {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(record)
    }
}

use std::collections::BTreeMap;

use pgvector::Vector;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{EmbeddingRecord, NewEmbedding, SearchResult};
use crate::types::{AppResult, Modality};

const RECORD_COLUMNS: &str =
    "id, content_id, modality, content, embedding, metadata, created_at, updated_at";

/// Parameters of a nearest-neighbour lookup.
#[derive(Debug, Clone)]
pub struct SimilarityQuery {
    pub embedding: Vec<f32>,
    pub target_modality: Option<Modality>,
    pub similarity_threshold: f64,
    pub max_results: i64,
}

impl SimilarityQuery {
    /// Compose the search statement.
    ///
    /// Similarity is cosine similarity (`1 - cosine distance`). Ordering is on
    /// the raw `<=>` expression so the HNSW index can serve the scan.
    pub fn build(&self) -> QueryBuilder<'static, Postgres> {
        let vector = Vector::from(self.embedding.clone());

        let mut qb = QueryBuilder::new(
            "SELECT content_id, modality, content, metadata, (1 - (embedding <=> ",
        );
        qb.push_bind(vector.clone());
        qb.push("))::float8 AS similarity FROM embeddings WHERE 1 - (embedding <=> ");
        qb.push_bind(vector.clone());
        qb.push(") >= ");
        qb.push_bind(self.similarity_threshold);

        if let Some(modality) = self.target_modality {
            qb.push(" AND modality = ");
            qb.push_bind(modality.as_str());
        }

        qb.push(" ORDER BY embedding <=> ");
        qb.push_bind(vector);
        qb.push(" LIMIT ");
        qb.push_bind(self.max_results);

        qb
    }
}

pub struct DatabaseOperations;

impl DatabaseOperations {
    /// Insert a row, or replace the existing row with the same `content_id`.
    pub async fn upsert_embedding(pool: &PgPool, new: &NewEmbedding) -> AppResult<EmbeddingRecord> {
        let sql = format!(
            r#"
            INSERT INTO embeddings (content_id, modality, content, embedding, metadata)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (content_id) DO UPDATE
            SET modality = EXCLUDED.modality,
                content = EXCLUDED.content,
                embedding = EXCLUDED.embedding,
                metadata = EXCLUDED.metadata,
                updated_at = NOW()
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );

        let record = sqlx::query_as::<_, EmbeddingRecord>(&sql)
            .bind(&new.content_id)
            .bind(new.modality.as_str())
            .bind(&new.content)
            .bind(Vector::from(new.embedding.clone()))
            .bind(&new.metadata)
            .fetch_one(pool)
            .await?;

        Ok(record)
    }

    pub async fn get_embedding(pool: &PgPool, content_id: &str) -> AppResult<Option<EmbeddingRecord>> {
        let sql = format!("SELECT {} FROM embeddings WHERE content_id = $1", RECORD_COLUMNS);

        let record = sqlx::query_as::<_, EmbeddingRecord>(&sql)
            .bind(content_id)
            .fetch_optional(pool)
            .await?;

        Ok(record)
    }

    /// Returns whether a row was removed.
    pub async fn delete_embedding(pool: &PgPool, content_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM embeddings WHERE content_id = $1")
            .bind(content_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn search_similar(pool: &PgPool, query: &SimilarityQuery) -> AppResult<Vec<SearchResult>> {
        let results = query
            .build()
            .build_query_as::<SearchResult>()
            .fetch_all(pool)
            .await?;

        Ok(results)
    }

    pub async fn count_embeddings(pool: &PgPool) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM embeddings")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn count_by_modality(pool: &PgPool) -> AppResult<BTreeMap<String, i64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT modality, COUNT(*) FROM embeddings GROUP BY modality",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}

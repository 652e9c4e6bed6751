//! CLIP embedding model wrapper for fastembed.
//!
//! Loads the ViT-B/32 text and vision encoders once at startup. Both encoders
//! project into the same 512-dimensional space, so text queries can retrieve
//! images and the other way round.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{
    EmbeddingModel, ImageEmbedding, ImageEmbeddingModel, ImageInitOptions, InitOptions,
    TextEmbedding,
};
use tracing::info;

use super::{l2_normalize, Embedder, EmbeddingError};
use crate::config::EmbeddingConfig;

/// Output width of both ViT-B/32 encoders.
pub const CLIP_VIT_B_32_DIMENSION: usize = 512;

/// Wrapper around fastembed's CLIP text and image encoders.
/// Uses a Mutex per encoder because fastembed's embed calls require &mut self.
pub struct ClipEmbedder {
    text: Arc<Mutex<TextEmbedding>>,
    vision: Arc<Mutex<ImageEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl ClipEmbedder {
    /// Load both encoders, downloading model files into the cache dir on first use.
    ///
    /// This blocks for the duration of the download and ONNX session setup, so
    /// call it from `spawn_blocking` when inside the runtime.
    pub fn load(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let (text_model, vision_model) = Self::parse_model_name(&config.model_name)?;
        if config.dimension != CLIP_VIT_B_32_DIMENSION {
            return Err(EmbeddingError::DimensionMismatch {
                expected: CLIP_VIT_B_32_DIMENSION,
                actual: config.dimension,
            });
        }

        std::fs::create_dir_all(&config.cache_dir).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to create model cache directory: {}", e))
        })?;

        info!(model = %config.model_name, cache_dir = %config.cache_dir.display(), "Loading CLIP text encoder");
        let text = TextEmbedding::try_new(
            InitOptions::new(text_model)
                .with_cache_dir(config.cache_dir.clone())
                .with_show_download_progress(config.show_download_progress),
        )
        .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        info!(model = %config.model_name, "Loading CLIP vision encoder");
        let vision = ImageEmbedding::try_new(
            ImageInitOptions::new(vision_model)
                .with_cache_dir(config.cache_dir.clone())
                .with_show_download_progress(config.show_download_progress),
        )
        .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        info!(dimension = config.dimension, "CLIP model loaded successfully");

        Ok(Self {
            text: Arc::new(Mutex::new(text)),
            vision: Arc::new(Mutex::new(vision)),
            model_name: config.model_name.clone(),
            dimension: config.dimension,
        })
    }

    /// Map a configured model name to the fastembed text/vision pair.
    fn parse_model_name(
        name: &str,
    ) -> Result<(EmbeddingModel, ImageEmbeddingModel), EmbeddingError> {
        match name.to_lowercase().as_str() {
            "vit-b-32" | "vit-b/32" | "clip-vit-b-32" | "clipvitb32" => {
                Ok((EmbeddingModel::ClipVitB32, ImageEmbeddingModel::ClipVitB32))
            }
            _ => Err(EmbeddingError::InvalidModel(format!(
                "Unknown model: {}. Supported models: ViT-B-32",
                name
            ))),
        }
    }
}

#[async_trait]
impl Embedder for ClipEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.text);
        let text = text.to_string();

        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model.lock().map_err(|e| {
                EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
            })?;
            model
                .embed(vec![text], None)
                .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))??;

        first_normalized(embeddings)
    }

    async fn embed_image(&self, image: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.vision);
        let bytes = image.to_vec();

        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model.lock().map_err(|e| {
                EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
            })?;
            model
                .embed_bytes(&[bytes.as_slice()], None)
                .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))??;

        first_normalized(embeddings)
    }
}

fn first_normalized(embeddings: Vec<Vec<f32>>) -> Result<Vec<f32>, EmbeddingError> {
    embeddings
        .into_iter()
        .next()
        .map(l2_normalize)
        .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding returned".to_string()))
}

// Embedding generation, file processing and vector search

pub mod clip;
pub mod document_processor;
pub mod image_input;
pub mod tabular;
pub mod vector_search;

pub use clip::*;
pub use document_processor::*;
pub use vector_search::*;

use async_trait::async_trait;

use crate::types::Modality;

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),

    #[error("Invalid base64 image data: {0}")]
    InvalidImage(String),

    #[error("Embedding model is not loaded")]
    NotReady,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Content ready to be handed to an encoder.
#[derive(Debug, Clone)]
pub enum EmbeddingInput {
    Text(String),
    Image(Vec<u8>),
}

impl EmbeddingInput {
    pub fn modality(&self) -> Modality {
        match self {
            EmbeddingInput::Text(_) => Modality::Text,
            EmbeddingInput::Image(_) => Modality::Image,
        }
    }
}

/// A model mapping text and images into one shared vector space.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    fn is_ready(&self) -> bool {
        true
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    async fn embed_image(&self, image: &[u8]) -> Result<Vec<f32>, EmbeddingError>;

    /// Dispatch on the input kind and check the output dimension.
    async fn embed(&self, input: &EmbeddingInput) -> Result<Vec<f32>, EmbeddingError> {
        if !self.is_ready() {
            return Err(EmbeddingError::NotReady);
        }

        let vector = match input {
            EmbeddingInput::Text(text) => self.embed_text(text).await?,
            EmbeddingInput::Image(bytes) => self.embed_image(bytes).await?,
        };

        if vector.len() != self.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension(),
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

/// Scale a vector to unit L2 norm. Zero vectors are returned unchanged.
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder {
        output: Vec<f32>,
        ready: bool,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn model_name(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            4
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self.output.clone())
        }

        async fn embed_image(&self, _image: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self.output.iter().map(|x| -x).collect())
        }
    }

    #[test]
    fn test_l2_normalize() {
        let v = l2_normalize(vec![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        assert_eq!(l2_normalize(vec![0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_embed_dispatches_by_input() {
        let embedder = FixedEmbedder {
            output: vec![1.0, 0.0, 0.0, 0.0],
            ready: true,
        };

        let text = embedder
            .embed(&EmbeddingInput::Text("hello".into()))
            .await
            .unwrap();
        assert_eq!(text, vec![1.0, 0.0, 0.0, 0.0]);

        let image = embedder
            .embed(&EmbeddingInput::Image(vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(image, vec![-1.0, 0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_embed_rejects_wrong_dimension() {
        let embedder = FixedEmbedder {
            output: vec![1.0, 0.0],
            ready: true,
        };

        let err = embedder
            .embed(&EmbeddingInput::Text("hello".into()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_embed_requires_ready_model() {
        let embedder = FixedEmbedder {
            output: vec![1.0, 0.0, 0.0, 0.0],
            ready: false,
        };

        let err = embedder
            .embed(&EmbeddingInput::Text("hello".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::NotReady));
    }

    #[test]
    fn test_input_modality() {
        assert_eq!(EmbeddingInput::Text(String::new()).modality(), Modality::Text);
        assert_eq!(EmbeddingInput::Image(Vec::new()).modality(), Modality::Image);
    }
}

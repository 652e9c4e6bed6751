// Type definitions, enums and the service error type

use std::str::FromStr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::embeddings::EmbeddingError;
use crate::models::ErrorResponse;

/// Kind of content an embedding row was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
}

impl Modality {
    pub const ALL: [Modality; 4] = [
        Modality::Text,
        Modality::Image,
        Modality::Audio,
        Modality::Video,
    ];

    /// Modalities the CLIP encoders can turn into vectors.
    pub const EMBEDDABLE: [Modality; 2] = [Modality::Text, Modality::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Audio => "audio",
            Modality::Video => "video",
        }
    }

    pub fn is_embeddable(&self) -> bool {
        Self::EMBEDDABLE.contains(self)
    }

    /// Parse a modality that is going to be fed to the embedder.
    ///
    /// Unknown strings and stored-only modalities (audio, video) are both
    /// rejected with the same message.
    pub fn parse_embeddable(value: &str) -> AppResult<Self> {
        match value.parse::<Modality>() {
            Ok(modality) if modality.is_embeddable() => Ok(modality),
            _ => Err(AppError::InvalidRequest(format!(
                "Unsupported modality: {}. Supported: text, image",
                value
            ))),
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Modality {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "image" => Ok(Modality::Image),
            "audio" => Ok(Modality::Audio),
            "video" => Ok(Modality::Video),
            other => Err(AppError::InvalidRequest(format!(
                "Unknown modality: {}. Expected one of: text, image, audio, video",
                other
            ))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Embedding(EmbeddingError::NotReady) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Embedding(EmbeddingError::InvalidImage(_)) => StatusCode::BAD_REQUEST,
            AppError::Embedding(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short error label used in the JSON envelope.
    fn label(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database error",
            AppError::Embedding(_) => "Embedding error",
            AppError::NotFound(_) => "Not found",
            AppError::InvalidRequest(_) => "Invalid request",
            AppError::PayloadTooLarge(_) => "Payload too large",
            AppError::Internal(_) => "Internal server error",
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Database(e) => e.to_string(),
            AppError::Embedding(e) => e.to_string(),
            AppError::NotFound(msg)
            | AppError::InvalidRequest(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::InvalidRequest(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, "Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: self.label().to_string(),
            detail: self.detail(),
            timestamp: chrono::Utc::now(),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_parsing() {
        assert_eq!("text".parse::<Modality>().unwrap(), Modality::Text);
        assert_eq!("IMAGE".parse::<Modality>().unwrap(), Modality::Image);
        assert_eq!(" video ".parse::<Modality>().unwrap(), Modality::Video);
        assert!("pdf".parse::<Modality>().is_err());
    }

    #[test]
    fn test_modality_display_roundtrips_through_serde() {
        for modality in Modality::ALL {
            let json = serde_json::to_string(&modality).unwrap();
            assert_eq!(json, format!("\"{}\"", modality));
        }
    }

    #[test]
    fn test_only_text_and_image_are_embeddable() {
        assert_eq!(Modality::parse_embeddable("text").unwrap(), Modality::Text);
        assert_eq!(Modality::parse_embeddable("image").unwrap(), Modality::Image);

        let err = Modality::parse_embeddable("audio").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("Unsupported modality: audio"));

        assert!(Modality::parse_embeddable("hologram").is_err());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::PayloadTooLarge("x".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::Embedding(EmbeddingError::NotReady).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Embedding(EmbeddingError::DimensionMismatch {
                expected: 512,
                actual: 3
            })
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

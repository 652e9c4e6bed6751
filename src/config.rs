use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub embedding: EmbeddingConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub api_title: String,
    pub api_version: String,
    pub api_description: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub model_name: String,
    pub dimension: usize,
    pub cache_dir: PathBuf,
    pub max_image_size: usize,
    pub show_download_progress: bool,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for the daily rolling log file. Console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            api_title: "Pany - Open Source Semantic Search".to_string(),
            api_version: env!("CARGO_PKG_VERSION").to_string(),
            api_description: "Self-hosted semantic search engine with multi-modal support"
                .to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 5,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: "ViT-B-32".to_string(),
            dimension: 512,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(env::temp_dir)
                .join("pany")
                .join("models"),
            max_image_size: 10 * 1024 * 1024,
            show_download_progress: true,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Configuration with defaults everywhere except the database URL.
    pub fn with_database_url(url: impl Into<String>) -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::with_url(url),
            embedding: EmbeddingConfig::default(),
            upload: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let defaults = Self::with_database_url(url);

        Ok(Self {
            server: ServerConfig {
                port: env_or("PORT", defaults.server.port)?,
                host: env::var("HOST").unwrap_or(defaults.server.host),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or(defaults.server.cors_allowed_origins),
                api_title: env::var("API_TITLE").unwrap_or(defaults.server.api_title),
                api_version: defaults.server.api_version,
                api_description: env::var("API_DESCRIPTION")
                    .unwrap_or(defaults.server.api_description),
            },
            database: DatabaseConfig {
                url: defaults.database.url,
                max_connections: env_or("DB_MAX_CONNECTIONS", defaults.database.max_connections)?,
                min_connections: env_or("DB_MIN_CONNECTIONS", defaults.database.min_connections)?,
                acquire_timeout_secs: env_or(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    defaults.database.acquire_timeout_secs,
                )?,
            },
            embedding: EmbeddingConfig {
                model_name: env::var("CLIP_MODEL_NAME").unwrap_or(defaults.embedding.model_name),
                dimension: env_or("EMBEDDING_DIMENSION", defaults.embedding.dimension)?,
                cache_dir: env::var("MODEL_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.embedding.cache_dir),
                max_image_size: env_or("MAX_IMAGE_SIZE", defaults.embedding.max_image_size)?,
                show_download_progress: env_or(
                    "SHOW_DOWNLOAD_PROGRESS",
                    defaults.embedding.show_download_progress,
                )?,
            },
            upload: UploadConfig {
                max_file_size: env_or("MAX_FILE_SIZE", defaults.upload.max_file_size)?,
            },
            logging: LoggingConfig {
                log_dir: env::var("LOG_DIR").ok().map(PathBuf::from),
            },
        })
    }
}

/// Read and parse an env var, falling back to `default` when it is unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_clip_vit_b_32() {
        let config = Config::with_database_url("postgres://localhost/pany");
        assert_eq!(config.embedding.dimension, 512);
        assert_eq!(config.embedding.model_name, "ViT-B-32");
        assert_eq!(config.embedding.max_image_size, 10 * 1024 * 1024);
        assert_eq!(config.upload.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.cors_allowed_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_env_or_falls_back_and_parses() {
        assert_eq!(env_or("PANY_TEST_UNSET_VARIABLE", 42u32).unwrap(), 42);

        env::set_var("PANY_TEST_PORT_VALUE", " 9000 ");
        assert_eq!(env_or("PANY_TEST_PORT_VALUE", 1u16).unwrap(), 9000);

        env::set_var("PANY_TEST_BAD_VALUE", "not-a-number");
        let err = env_or("PANY_TEST_BAD_VALUE", 1u16).unwrap_err();
        assert!(err.to_string().contains("PANY_TEST_BAD_VALUE"));
    }
}

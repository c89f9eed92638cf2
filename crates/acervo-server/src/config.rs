//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files: bind address, database and image
//! locations, upload limits, and the `[ingest]` and `[extractor]` tables.

use acervo_extractor::ExtractorConfig;
use acervo_ingest::IngestConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// SQLite database file; `:memory:` for a throwaway catalog
    pub database_path: String,

    /// Directory uploaded images are written to
    pub image_dir: String,

    /// URL prefix stored images are served under
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Maximum request body size (default: 25 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Transcription extraction limits
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8080
}

fn default_image_base_url() -> String {
    "/images".to_string()
}

/// Default request body limit: 25 MiB
fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            database_path: "acervo.db".to_string(),
            image_dir: "data/images".to_string(),
            image_base_url: default_image_base_url(),
            max_upload_bytes: default_max_upload_bytes(),
            ingest: IngestConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingField("database_path".to_string()));
        }
        if self.image_dir.trim().is_empty() {
            return Err(ConfigError::MissingField("image_dir".to_string()));
        }
        if !self.image_base_url.starts_with('/') || self.image_base_url.trim_end_matches('/').is_empty() {
            return Err(ConfigError::Invalid(format!(
                "image_base_url must be an absolute path below '/', got '{}'",
                self.image_base_url
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        self.ingest.validate().map_err(ConfigError::Invalid)?;
        self.extractor.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Create a configuration for testing: in-memory catalog, images under
    /// the system temp directory
    pub fn default_test_config() -> Self {
        ServerConfig {
            database_path: ":memory:".to_string(),
            image_dir: std::env::temp_dir()
                .join("acervo-test-images")
                .to_string_lossy()
                .into_owned(),
            ..ServerConfig::default()
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

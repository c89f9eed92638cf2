//! Configuration for the ingestion pipeline

use serde::{Deserialize, Serialize};

/// Image reference used when a submission has no image
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/api/placeholder/160/200";

/// Configuration for the IngestionPipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Reference stored for documents submitted without an image;
    /// empty means "no reference"
    pub placeholder_image_url: String,

    /// Maximum accepted image size (bytes)
    pub max_image_bytes: usize,
}

impl IngestConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_image_bytes == 0 {
            return Err("max_image_bytes must be greater than 0".to_string());
        }
        Ok(())
    }

    /// The placeholder reference, if one is configured
    pub fn placeholder(&self) -> Option<String> {
        let url = self.placeholder_image_url.trim();
        (!url.is_empty()).then(|| url.to_string())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            placeholder_image_url: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

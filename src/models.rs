use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Asset base location of the default lesion classifier export.
pub const DEFAULT_MODEL_BASE_URL: &str =
    "https://huggingface.co/dermascan/lesion-mobilenet/resolve/main/";

/// File name of the model definition under the base location.
pub const MODEL_FILE: &str = "model.onnx";
/// File name of the model metadata under the base location.
pub const METADATA_FILE: &str = "metadata.json";

const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Where the classifier assets come from and where they are cached.
///
/// The two assets (`model.onnx` and `metadata.json`) are resolved relative to
/// `base_url`. Hashes are optional: when pinned, downloaded files are verified
/// against them; when absent, whatever the export serves is accepted.
#[derive(Debug, Clone)]
pub struct ModelSource {
    /// Cache subdirectory name for this model.
    pub name: String,
    /// Base URL the model definition and metadata are fetched from.
    pub base_url: String,
    /// Pinned SHA-256 of the model definition, if known.
    pub model_hash: Option<String>,
    /// Pinned SHA-256 of the metadata file, if known.
    pub metadata_hash: Option<String>,
}

impl ModelSource {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            model_hash: None,
            metadata_hash: None,
        }
    }

    /// The default source: `DERMASCAN_MODEL_URL` if set, the built-in export
    /// location otherwise.
    pub fn from_env() -> Self {
        let base_url =
            env::var("DERMASCAN_MODEL_URL").unwrap_or_else(|_| DEFAULT_MODEL_BASE_URL.to_string());
        Self::new("lesion-mobilenet", base_url)
    }

    pub fn with_hashes(
        mut self,
        model_hash: impl Into<String>,
        metadata_hash: impl Into<String>,
    ) -> Self {
        self.model_hash = Some(model_hash.into());
        self.metadata_hash = Some(metadata_hash.into());
        self
    }

    pub fn model_url(&self) -> String {
        join_url(&self.base_url, MODEL_FILE)
    }

    pub fn metadata_url(&self) -> String {
        join_url(&self.base_url, METADATA_FILE)
    }
}

fn join_url(base: &str, file: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{file}")
    } else {
        format!("{base}/{file}")
    }
}

/// Returns the default cache directory for downloaded classifier assets.
pub fn default_cache_dir() -> PathBuf {
    // 1. Check environment variable
    if let Ok(path) = env::var("DERMASCAN_CACHE") {
        return PathBuf::from(path).join("models");
    }

    // 2. Use platform-specific cache directory
    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join("dermascan").join("models");
    }

    // 3. Fallback to user's home directory
    if let Some(home_dir) = dirs::home_dir() {
        return home_dir.join(".cache").join("dermascan").join("models");
    }

    // 4. If all else fails, use system temp directory (platform agnostic)
    env::temp_dir().join("dermascan").join("models")
}

/// Metadata shipped next to the model definition by the training export.
///
/// `labels` are in the model's output emission order; `imageSize` is the side
/// length of the square input the model was trained on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub labels: Vec<String>,
    #[serde(rename = "imageSize", default = "default_image_size")]
    pub image_size: u32,
}

fn default_image_size() -> u32 {
    DEFAULT_IMAGE_SIZE
}

impl ModelMetadata {
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let metadata: Self = serde_json::from_slice(bytes)?;
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_dir() {
        // Test with environment variable
        env::set_var("DERMASCAN_CACHE", "/tmp/test-cache");
        let path = default_cache_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-cache/models"));
        env::remove_var("DERMASCAN_CACHE");

        // Test without environment variable
        let path = default_cache_dir();
        assert!(path.to_str().unwrap().contains("dermascan/models"));
    }

    #[test]
    fn test_asset_urls() {
        let source = ModelSource::new("lesion", "https://example.com/export");
        assert_eq!(source.model_url(), "https://example.com/export/model.onnx");
        assert_eq!(
            source.metadata_url(),
            "https://example.com/export/metadata.json"
        );

        let trailing = ModelSource::new("lesion", "https://example.com/export/");
        assert_eq!(trailing.model_url(), "https://example.com/export/model.onnx");
    }

    #[test]
    fn test_metadata_parsing() {
        let metadata =
            ModelMetadata::parse(br#"{"labels": ["0_Normal", "4_Malignant"], "imageSize": 96}"#)
                .unwrap();
        assert_eq!(metadata.labels.len(), 2);
        assert_eq!(metadata.image_size, 96);

        let defaulted = ModelMetadata::parse(br#"{"labels": ["0_Normal"]}"#).unwrap();
        assert_eq!(defaulted.image_size, 224);

        assert!(ModelMetadata::parse(b"not json").is_err());
    }
}

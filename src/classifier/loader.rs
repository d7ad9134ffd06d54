use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::backend::LesionClassifier;
use super::onnx::OnnxClassifier;
use crate::model_manager::LoadError;
use crate::models::{default_cache_dir, ModelMetadata, ModelSource, METADATA_FILE, MODEL_FILE};

/// Produces a ready classifier resource from a configured source.
///
/// The lifecycle manager drives at most one load at a time through this seam,
/// so implementations need no coordination of their own. Tests substitute a
/// fake; production uses [`HttpClassifierLoader`].
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self, source: &ModelSource) -> Result<Arc<dyn LesionClassifier>, LoadError>;
}

/// Fetches the two classifier assets over HTTP, caches them on disk, and
/// builds the ONNX session. Cached files are reused when present (and
/// verified first when the source pins hashes).
pub struct HttpClassifierLoader {
    cache_dir: PathBuf,
}

impl HttpClassifierLoader {
    /// Creates a loader caching into the default models directory.
    pub fn new_default() -> io::Result<Self> {
        Self::new(default_cache_dir())
    }

    pub fn new<P: AsRef<Path>>(cache_dir: P) -> io::Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    pub fn model_path(&self, source: &ModelSource) -> PathBuf {
        self.cache_dir.join(&source.name).join(MODEL_FILE)
    }

    pub fn metadata_path(&self, source: &ModelSource) -> PathBuf {
        self.cache_dir.join(&source.name).join(METADATA_FILE)
    }

    /// Deletes any cached assets for this source.
    pub fn remove_cached(&self, source: &ModelSource) -> io::Result<()> {
        for path in [self.model_path(source), self.metadata_path(source)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    async fn fetch_asset(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        asset: &'static str,
    ) -> Result<Vec<u8>, LoadError> {
        if path.exists() {
            let bytes = fs::read(path).map_err(|e| LoadError::io(asset, e))?;
            match expected_hash {
                Some(expected) if sha256_hex(&bytes) != expected => {
                    log::warn!("cached {asset} failed verification, refetching");
                }
                _ => {
                    log::info!("using cached {asset} at {path:?}");
                    return Ok(bytes);
                }
            }
        }

        log::info!("fetching {asset} from {url}");
        let response = reqwest::get(url)
            .await
            .map_err(|e| LoadError::fetch(asset, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Fetch {
                asset,
                message: format!("HTTP {status} from {url}"),
            });
        }
        let bytes = response.bytes().await.map_err(|e| LoadError::fetch(asset, e))?;
        log::info!("downloaded {} bytes of {asset}", bytes.len());

        if let Some(expected) = expected_hash {
            let actual = sha256_hex(&bytes);
            if actual != expected {
                log::error!("{asset} hash mismatch: expected {expected}, got {actual}");
                return Err(LoadError::HashMismatch {
                    asset,
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LoadError::io(asset, e))?;
        }
        fs::write(path, &bytes).map_err(|e| LoadError::io(asset, e))?;
        log::info!("{asset} cached at {path:?}");

        Ok(bytes.to_vec())
    }

    async fn load_inner(&self, source: &ModelSource) -> Result<Arc<dyn LesionClassifier>, LoadError> {
        // Stage 1: the model definition
        let model_path = self.model_path(source);
        self.fetch_asset(
            &source.model_url(),
            &model_path,
            source.model_hash.as_deref(),
            "model",
        )
        .await?;

        // Stage 2: the metadata that names the output classes
        let metadata_bytes = self
            .fetch_asset(
                &source.metadata_url(),
                &self.metadata_path(source),
                source.metadata_hash.as_deref(),
                "metadata",
            )
            .await?;
        let metadata =
            ModelMetadata::parse(&metadata_bytes).map_err(|e| LoadError::Metadata(e.to_string()))?;

        let classifier = OnnxClassifier::from_file(&model_path, metadata)?;
        Ok(Arc::new(classifier))
    }
}

#[async_trait]
impl ClassifierLoader for HttpClassifierLoader {
    async fn load(&self, source: &ModelSource) -> Result<Arc<dyn LesionClassifier>, LoadError> {
        match self.load_inner(source).await {
            Ok(classifier) => Ok(classifier),
            Err(err) => {
                // Leave no partial download behind; the next attempt starts clean.
                if let Err(cleanup) = self.remove_cached(source) {
                    log::warn!("failed to clean up cached assets: {cleanup}");
                }
                Err(err)
            }
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        // Known digest of the empty input
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_cached_asset_reused_without_network() {
        let dir = std::env::temp_dir().join("dermascan-loader-test");
        let loader = HttpClassifierLoader::new(&dir).unwrap();
        let source = ModelSource::new("cached", "http://invalid.localhost/export");

        let path = loader.metadata_path(&source);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, br#"{"labels": ["0_Normal"]}"#).unwrap();

        // The URL is unreachable; a cache hit must not touch it.
        let bytes = loader
            .fetch_asset(&source.metadata_url(), &path, None, "metadata")
            .await
            .unwrap();
        assert_eq!(bytes, br#"{"labels": ["0_Normal"]}"#);

        loader.remove_cached(&source).unwrap();
        assert!(!path.exists());
    }
}

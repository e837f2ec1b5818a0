// floe-core/src/infrastructure/store/local.rs

// Content-addressed blob store on the local filesystem, laid out like an OCI
// image layout: <root>/blobs/sha256/<hex>.

use crate::domain::compiler::{digest_hex, sha256_digest};
use crate::error::FloeError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;
use crate::ports::{ArtifactDescriptor, ArtifactStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blob_path(&self, digest: &str) -> Result<PathBuf, InfrastructureError> {
        let hex = digest_hex(digest)
            .ok_or_else(|| InfrastructureError::InvalidDigest(digest.to_string()))?;
        Ok(self.root.join("blobs").join("sha256").join(hex))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, media_type: &str, bytes: &[u8]) -> Result<ArtifactDescriptor, FloeError> {
        let digest = sha256_digest(bytes);
        let path = self.blob_path(&digest)?;
        let descriptor = ArtifactDescriptor {
            media_type: media_type.to_string(),
            digest: digest.clone(),
            size: bytes.len() as u64,
        };

        if tokio::fs::try_exists(&path).await? {
            debug!(%digest, "Blob already stored");
            return Ok(descriptor);
        }

        let content = bytes.to_vec();
        tokio::task::spawn_blocking(move || atomic_write(&path, content))
            .await
            .map_err(|e| InfrastructureError::Io(std::io::Error::other(e)))??;

        info!(%digest, media_type, "Blob stored");
        Ok(descriptor)
    }

    /// Bytes are re-hashed on read; a blob that does not match its name is
    /// reported as corrupt rather than returned.
    async fn get(&self, digest: &str) -> Result<Vec<u8>, FloeError> {
        let path = self.blob_path(digest)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(InfrastructureError::BlobNotFound(digest.to_string()).into());
            }
            Err(e) => return Err(e.into()),
        };
        let actual = sha256_digest(&bytes);
        if actual != digest {
            return Err(InfrastructureError::DigestMismatch {
                expected: digest.to_string(),
                actual,
            }
            .into());
        }
        Ok(bytes)
    }

    async fn exists(&self, digest: &str) -> Result<bool, FloeError> {
        let path = self.blob_path(digest)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    const MEDIA_TYPE: &str = "application/vnd.floe.compiled-artifacts.v1+json";

    #[tokio::test]
    async fn test_put_then_get() -> Result<()> {
        let dir = tempdir()?;
        let store = LocalArtifactStore::new(dir.path());

        let descriptor = store.put(MEDIA_TYPE, b"{\"version\":\"1.0.0\"}").await?;
        assert_eq!(descriptor.size, 19);
        assert!(descriptor.digest.starts_with("sha256:"));
        assert!(store.exists(&descriptor.digest).await?);
        assert_eq!(store.get(&descriptor.digest).await?, b"{\"version\":\"1.0.0\"}");

        let hex = descriptor.digest.trim_start_matches("sha256:");
        assert!(dir.path().join("blobs/sha256").join(hex).is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_blob_is_never_rewritten() -> Result<()> {
        let dir = tempdir()?;
        let store = LocalArtifactStore::new(dir.path());
        let first = store.put(MEDIA_TYPE, b"abc").await?;
        let path = store.blob_path(&first.digest)?;
        let before = std::fs::metadata(&path)?.modified()?;

        let second = store.put(MEDIA_TYPE, b"abc").await?;
        assert_eq!(first, second);
        assert_eq!(std::fs::metadata(&path)?.modified()?, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_malformed_and_corrupt_blobs() -> Result<()> {
        let dir = tempdir()?;
        let store = LocalArtifactStore::new(dir.path());

        let missing = sha256_digest(b"nothing here");
        assert!(!store.exists(&missing).await?);
        assert!(matches!(
            store.get(&missing).await,
            Err(FloeError::Infrastructure(InfrastructureError::BlobNotFound(_)))
        ));
        assert!(matches!(
            store.get("md5:1234").await,
            Err(FloeError::Infrastructure(InfrastructureError::InvalidDigest(_)))
        ));
        let uppercase = format!("sha256:{}", missing["sha256:".len()..].to_uppercase());
        assert!(matches!(
            store.get(&uppercase).await,
            Err(FloeError::Infrastructure(InfrastructureError::InvalidDigest(_)))
        ));

        let descriptor = store.put(MEDIA_TYPE, b"original").await?;
        std::fs::write(store.blob_path(&descriptor.digest)?, b"tampered")?;
        assert!(matches!(
            store.get(&descriptor.digest).await,
            Err(FloeError::Infrastructure(InfrastructureError::DigestMismatch { .. }))
        ));
        Ok(())
    }
}

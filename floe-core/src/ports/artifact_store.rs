// floe-core/src/ports/artifact_store.rs

// Where compiled artifacts go once digested. The compiler only needs a
// content-addressed put/get; whether the bytes land on disk or in an OCI
// registry is the adapter's business.

use crate::error::FloeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reference to a stored blob, in the spirit of an OCI descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDescriptor {
    pub media_type: String,
    /// `sha256:<hex>`
    pub digest: String,
    pub size: u64,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores `bytes` under their digest. Storing the same bytes twice is a
    /// no-op that returns the same descriptor; stored blobs are never rewritten.
    async fn put(&self, media_type: &str, bytes: &[u8]) -> Result<ArtifactDescriptor, FloeError>;

    async fn get(&self, digest: &str) -> Result<Vec<u8>, FloeError>;

    async fn exists(&self, digest: &str) -> Result<bool, FloeError>;
}

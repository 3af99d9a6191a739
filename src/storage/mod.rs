//! Durable object storage for raw audio artifacts.

mod fs;

pub use fs::FsArtifactStore;

use anyhow::Result;
use serde::Serialize;

/// A stored raw-audio object.
#[derive(Debug, Clone, Serialize)]
pub struct StoredArtifact {
    /// Opaque key, unique per upload, scoped to the owner
    pub key: String,
    /// Resolvable read location
    pub url: String,
}

#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
        owner_id: &str,
    ) -> Result<StoredArtifact>;

    /// Delete by key. Idempotent: deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::{ArtifactStore, StoredArtifact};

/// Filesystem-backed artifact store.
///
/// Keys look like `<owner>/<uuid>-<filename>` and resolve as URLs beneath
/// `public_base`, which the HTTP layer serves from `root`.
pub struct FsArtifactStore {
    root: PathBuf,
    public_base: String,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sanitize(file_name: &str) -> String {
        let cleaned: String = file_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if cleaned.is_empty() {
            "audio".to_string()
        } else {
            cleaned
        }
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
        owner_id: &str,
    ) -> Result<StoredArtifact> {
        let key = format!(
            "{}/{}-{}",
            Self::sanitize(owner_id),
            uuid::Uuid::new_v4(),
            Self::sanitize(file_name)
        );

        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create artifact directory")?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write artifact {}", path.display()))?;

        debug!(
            "Stored artifact {key} ({} bytes, {mime_type})",
            bytes.len()
        );

        Ok(StoredArtifact {
            url: format!("{}/{}", self.public_base.trim_end_matches('/'), key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.root.join(key);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted artifact {key}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete artifact {key}")),
        }
    }
}

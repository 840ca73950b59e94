//! services/api/src/adapters/blob.rs
//!
//! A `BlobStorageService` backed by the local filesystem. Objects live under
//! `<root>/<bucket>/<path>` and are served by the router under `/media`.

use async_trait::async_trait;
use bytes::Bytes;
use interview_core::ports::{BlobStorageService, PortError, PortResult};
use std::path::{Component, Path, PathBuf};
use tracing::info;

#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, path: &str) -> PortResult<PathBuf> {
        let relative = Path::new(path);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !is_plain {
            return Err(PortError::InvalidInput(format!("Invalid storage path '{}'", path)));
        }
        Ok(self.root.join(&self.bucket).join(relative))
    }
}

#[async_trait]
impl BlobStorageService for LocalBlobStore {
    async fn upload(&self, path: &str, content: Bytes, content_type: &str) -> PortResult<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&target, &content)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write {}: {}", target.display(), e)))?;

        info!("Stored {} bytes ({}) at {}", content.len(), content_type, target.display());
        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/media/{}/{}", self.public_base_url, self.bucket, path)
    }
}

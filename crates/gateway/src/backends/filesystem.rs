//! Local filesystem gateway backend.
//!
//! Buckets are directories under a root; the ACL and website configuration
//! are persisted as `.acl` and `.website` marker files inside the bucket
//! directory. Useful for development and tests.

use crate::error::{GatewayError, GatewayResult};
use crate::traits::BucketGateway;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Marker file holding the bucket's ACL policy.
const ACL_FILE: &str = ".acl";

/// Marker file holding the bucket's website configuration.
const WEBSITE_FILE: &str = ".website";

/// ACL policy applied to published site buckets.
const PUBLIC_READ: &str = "public-read";

/// Local filesystem bucket gateway.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend rooted at `root`.
    pub async fn new(root: impl AsRef<Path>) -> GatewayResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Get the directory for a bucket, rejecting names that would escape the
    /// root or collide with the marker files.
    fn bucket_path(&self, bucket: &str) -> GatewayResult<PathBuf> {
        if bucket.is_empty() {
            return Err(GatewayError::InvalidBucket("empty".to_string()));
        }
        if bucket.contains('/') || bucket.contains('\\') || bucket.contains("..") {
            return Err(GatewayError::InvalidBucket(format!(
                "path traversal not allowed: {bucket}"
            )));
        }
        if bucket.starts_with('.') {
            return Err(GatewayError::InvalidBucket(format!(
                "leading dot not allowed: {bucket}"
            )));
        }
        Ok(self.root.join(bucket))
    }

    async fn require_bucket(&self, bucket: &str) -> GatewayResult<PathBuf> {
        let path = self.bucket_path(bucket)?;
        if !fs::try_exists(&path).await? {
            return Err(GatewayError::NotFound(bucket.to_string()));
        }
        Ok(path)
    }
}

#[async_trait]
impl BucketGateway for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn bucket_exists(&self, bucket: &str) -> GatewayResult<bool> {
        let path = self.bucket_path(bucket)?;
        Ok(fs::try_exists(&path).await?)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn create_bucket(&self, bucket: &str) -> GatewayResult<()> {
        let path = self.bucket_path(bucket)?;
        fs::create_dir(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                GatewayError::AlreadyExists(bucket.to_string())
            } else {
                GatewayError::Io(e)
            }
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn set_acl(&self, bucket: &str) -> GatewayResult<()> {
        let path = self.require_bucket(bucket).await?;
        fs::write(path.join(ACL_FILE), PUBLIC_READ).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn set_website_index(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> GatewayResult<()> {
        let path = self.require_bucket(bucket).await?;
        let config = serde_json::json!({
            "index_document": index_document,
            "error_document": error_document,
        });
        fs::write(path.join(WEBSITE_FILE), config.to_string()).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn health_check(&self) -> GatewayResult<()> {
        if !fs::try_exists(&self.root).await? {
            return Err(GatewayError::Config(format!(
                "gateway root missing: {}",
                self.root.display()
            )));
        }
        Ok(())
    }
}

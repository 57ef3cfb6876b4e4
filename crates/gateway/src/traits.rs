//! Storage gateway trait definitions.

use crate::error::GatewayResult;
use async_trait::async_trait;

/// Bucket-level operations against an object storage service.
///
/// Each call is independently fallible; none is assumed atomic with respect
/// to the others. Creating a bucket that already exists is an error the
/// caller must tolerate (the provisioning pipeline checks existence first
/// and skips the create stage).
#[async_trait]
pub trait BucketGateway: Send + Sync + 'static {
    /// Check whether a bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> GatewayResult<bool>;

    /// Create a bucket.
    async fn create_bucket(&self, bucket: &str) -> GatewayResult<()>;

    /// Apply the public-read ACL policy required for published sites.
    async fn set_acl(&self, bucket: &str) -> GatewayResult<()>;

    /// Configure the bucket's website index and error documents.
    async fn set_website_index(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> GatewayResult<()>;

    /// Get the name of this gateway backend.
    ///
    /// Returns a static string identifier for the backend type (e.g., "s3",
    /// "filesystem"). Used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify gateway connectivity.
    ///
    /// The default implementation returns Ok(()), suitable for backends
    /// that don't require connectivity verification.
    async fn health_check(&self) -> GatewayResult<()> {
        Ok(())
    }
}

//! Storage gateway abstraction and backends for steward.
//!
//! The gateway exposes the bucket-level operations the provisioning pipeline
//! needs: existence checks, creation, ACL policy, and website index
//! configuration. Backends: local filesystem and S3-compatible.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::{filesystem::FilesystemBackend, s3::S3Backend};
pub use error::{GatewayError, GatewayResult};
pub use traits::BucketGateway;

use std::sync::Arc;
use steward_core::config::GatewayConfig;

/// Create a bucket gateway from configuration.
pub async fn from_config(config: &GatewayConfig) -> GatewayResult<Arc<dyn BucketGateway>> {
    config.validate().map_err(GatewayError::Config)?;

    match config {
        GatewayConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
        GatewayConfig::S3 {
            endpoint,
            region,
            access_key_id,
            secret_access_key,
            force_path_style,
        } => {
            let backend = S3Backend::new(
                endpoint.clone(),
                region.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
                *force_path_style,
            )
            .await?;
            Ok(Arc::new(backend))
        }
    }
}

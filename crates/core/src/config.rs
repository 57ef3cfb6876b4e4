//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Coordination store backend.
    pub coordination: CoordinationConfig,
    /// Storage gateway backend.
    pub gateway: GatewayConfig,
    /// Worker behavior.
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl AppConfig {
    /// Create a test configuration backed by local paths.
    ///
    /// **For testing only.** Paths are relative to the working directory;
    /// tests that touch the stores should build them against a temp dir
    /// instead.
    pub fn for_testing() -> Self {
        Self {
            coordination: CoordinationConfig::Sqlite {
                path: PathBuf::from("steward-test.db"),
            },
            gateway: GatewayConfig::Filesystem {
                path: PathBuf::from("steward-test-buckets"),
            },
            worker: WorkerConfig::default(),
        }
    }
}

/// Coordination store backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CoordinationConfig {
    /// SQLite-backed path-addressed store.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
}

/// Storage gateway backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GatewayConfig {
    /// Local filesystem gateway (buckets as directories).
    Filesystem {
        /// Root directory for buckets.
        path: PathBuf,
    },
    /// S3-compatible gateway.
    S3 {
        /// Optional endpoint URL (for MinIO, etc.).
        #[serde(default)]
        endpoint: Option<String>,
        /// AWS region.
        #[serde(default)]
        region: Option<String>,
        /// Explicit access key id. When unset, the ambient AWS credential
        /// chain is used.
        #[serde(default)]
        access_key_id: Option<String>,
        /// Explicit secret access key. Must be set together with
        /// `access_key_id`.
        #[serde(default)]
        secret_access_key: Option<String>,
        /// Use path-style URLs instead of virtual-hosted style. Required
        /// for MinIO and some S3-compatible services.
        #[serde(default)]
        force_path_style: bool,
    },
}

impl GatewayConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            GatewayConfig::Filesystem { path } => {
                if path.as_os_str().is_empty() {
                    return Err("filesystem gateway requires a non-empty path".to_string());
                }
                Ok(())
            }
            GatewayConfig::S3 {
                access_key_id,
                secret_access_key,
                ..
            } => {
                if access_key_id.is_some() ^ secret_access_key.is_some() {
                    return Err(
                        "s3 config requires both access_key_id and secret_access_key when either is set"
                            .to_string(),
                    );
                }
                Ok(())
            }
        }
    }
}

/// Worker behavior configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Website index document configured on provisioned buckets.
    #[serde(default = "default_index_document")]
    pub index_document: String,
    /// Website error document configured on provisioned buckets.
    #[serde(default = "default_error_document")]
    pub error_document: String,
    /// Billing plan id written for newly provisioned sites.
    #[serde(default = "default_plan_id")]
    pub plan_id: String,
}

fn default_index_document() -> String {
    "index.html".to_string()
}

fn default_error_document() -> String {
    "404.html".to_string()
}

fn default_plan_id() -> String {
    "mainplan".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            index_document: default_index_document(),
            error_document: default_error_document(),
            plan_id: default_plan_id(),
        }
    }
}

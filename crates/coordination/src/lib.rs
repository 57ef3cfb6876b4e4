//! Coordination store client for steward.
//!
//! The coordination store is a path-addressed key-value tree holding site
//! records, billing records, and credential-keyed site data. Writes are
//! single-path and last-writer-wins; reads are read-then-act snapshots.
//!
//! This crate provides:
//! - Typed repository traits over the tree ([`SiteRepo`], [`BillingRepo`],
//!   [`SiteDataRepo`]), combined into [`CoordinationStore`]
//! - A SQLite-backed implementation ([`SqliteStore`])

pub mod error;
pub mod models;
pub mod paths;
pub mod store;

pub use error::{CoordinationError, CoordinationResult};
pub use models::{BillingRecord, SiteMessage, SiteRecord};
pub use store::{BillingRepo, CoordinationStore, SiteDataRepo, SiteRepo, SqliteStore};

use std::sync::Arc;
use steward_core::config::CoordinationConfig;

/// Create a coordination store from configuration.
pub async fn from_config(
    config: &CoordinationConfig,
) -> CoordinationResult<Arc<dyn CoordinationStore>> {
    match config {
        CoordinationConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store))
        }
    }
}

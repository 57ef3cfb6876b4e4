//! Common test fixtures for intake tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use steward_coordination::models::SiteRecord;
use steward_coordination::{SiteRepo, SqliteStore};
use steward_core::config::WorkerConfig;
use steward_core::{SiteName, UserId};
use steward_gateway::{BucketGateway, GatewayError, GatewayResult};
use steward_lifecycle::Lifecycle;
use steward_worker::JobIntake;
use tempfile::TempDir;
use tokio::sync::{Semaphore, oneshot};

/// Minimal in-memory gateway with a create-failure switch.
#[derive(Default)]
pub struct MockGateway {
    buckets: Mutex<HashSet<String>>,
    pub fail_create: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BucketGateway for MockGateway {
    async fn bucket_exists(&self, bucket: &str) -> GatewayResult<bool> {
        Ok(self.buckets.lock().unwrap().contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> GatewayResult<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::S3("injected create failure".into()));
        }
        self.buckets.lock().unwrap().insert(bucket.to_string());
        Ok(())
    }

    async fn set_acl(&self, _bucket: &str) -> GatewayResult<()> {
        Ok(())
    }

    async fn set_website_index(
        &self,
        _bucket: &str,
        _index_document: &str,
        _error_document: &str,
    ) -> GatewayResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

/// Gateway whose create stage blocks until released, for exercising the
/// in-flight duplicate contract.
pub struct GatedGateway {
    started_tx: Mutex<Option<oneshot::Sender<()>>>,
    gate: Semaphore,
}

impl GatedGateway {
    /// Returns the gateway and a receiver that fires once the create stage
    /// has been entered.
    pub fn new() -> (Arc<Self>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let gateway = Arc::new(Self {
            started_tx: Mutex::new(Some(tx)),
            gate: Semaphore::new(0),
        });
        (gateway, rx)
    }

    /// Let the blocked create stage finish.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl BucketGateway for GatedGateway {
    async fn bucket_exists(&self, _bucket: &str) -> GatewayResult<bool> {
        Ok(false)
    }

    async fn create_bucket(&self, _bucket: &str) -> GatewayResult<()> {
        if let Some(tx) = self.started_tx.lock().unwrap().take() {
            let _ = tx.send(());
        }
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| GatewayError::S3(e.to_string().into()))?;
        permit.forget();
        Ok(())
    }

    async fn set_acl(&self, _bucket: &str) -> GatewayResult<()> {
        Ok(())
    }

    async fn set_website_index(
        &self,
        _bucket: &str,
        _index_document: &str,
        _error_document: &str,
    ) -> GatewayResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "gated"
    }
}

/// Build an intake adapter over a fresh SQLite store and the given gateway.
pub async fn build_intake(
    gateway: Arc<dyn BucketGateway>,
) -> (TempDir, Arc<SqliteStore>, Arc<JobIntake>) {
    let temp = tempfile::tempdir().unwrap();
    let store = Arc::new(
        SqliteStore::new(temp.path().join("coordination.db"))
            .await
            .unwrap(),
    );
    let lifecycle = Arc::new(Lifecycle::new(
        store.clone(),
        gateway,
        WorkerConfig::default(),
    ));
    let intake = Arc::new(JobIntake::new(lifecycle, store.clone()));
    (temp, store, intake)
}

pub fn site(name: &str) -> SiteName {
    SiteName::parse(name).unwrap()
}

pub fn owner() -> UserId {
    UserId::parse("u1@example.com").unwrap()
}

pub async fn seed_site(store: &SqliteStore, site: &SiteName, user: &UserId) {
    store
        .create_site(site, &SiteRecord::with_owner(user))
        .await
        .unwrap();
}

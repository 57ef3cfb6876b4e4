//! Common test fixtures: a call-recording mock gateway and store builders.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use steward_coordination::models::SiteRecord;
use steward_coordination::{SiteRepo, SqliteStore};
use steward_core::config::WorkerConfig;
use steward_core::{SiteName, UserId};
use steward_gateway::{BucketGateway, GatewayError, GatewayResult};
use steward_lifecycle::Lifecycle;
use tempfile::TempDir;

/// In-memory bucket gateway that records every call and can inject failures
/// per operation.
#[derive(Default)]
pub struct MockGateway {
    buckets: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    pub fail_lookup: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_acl: AtomicBool,
    pub fail_index: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway where `bucket` already exists.
    pub fn with_bucket(bucket: &str) -> Self {
        let gateway = Self::default();
        gateway.buckets.lock().unwrap().insert(bucket.to_string());
        gateway
    }

    /// Every gateway call made so far, as `op:bucket` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.lock().unwrap().contains(bucket)
    }

    fn record(&self, op: &str, bucket: &str) {
        self.calls.lock().unwrap().push(format!("{op}:{bucket}"));
    }

    fn injected(op: &str) -> GatewayError {
        GatewayError::S3(format!("injected {op} failure").into())
    }
}

#[async_trait]
impl BucketGateway for MockGateway {
    async fn bucket_exists(&self, bucket: &str) -> GatewayResult<bool> {
        self.record("exists", bucket);
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(Self::injected("lookup"));
        }
        Ok(self.buckets.lock().unwrap().contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> GatewayResult<()> {
        self.record("create", bucket);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::injected("create"));
        }
        let mut buckets = self.buckets.lock().unwrap();
        if !buckets.insert(bucket.to_string()) {
            return Err(GatewayError::AlreadyExists(bucket.to_string()));
        }
        Ok(())
    }

    async fn set_acl(&self, bucket: &str) -> GatewayResult<()> {
        self.record("acl", bucket);
        if self.fail_acl.load(Ordering::SeqCst) {
            return Err(Self::injected("acl"));
        }
        if !self.buckets.lock().unwrap().contains(bucket) {
            return Err(GatewayError::NotFound(bucket.to_string()));
        }
        Ok(())
    }

    async fn set_website_index(
        &self,
        bucket: &str,
        _index_document: &str,
        _error_document: &str,
    ) -> GatewayResult<()> {
        self.record("index", bucket);
        if self.fail_index.load(Ordering::SeqCst) {
            return Err(Self::injected("index"));
        }
        if !self.buckets.lock().unwrap().contains(bucket) {
            return Err(GatewayError::NotFound(bucket.to_string()));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a lifecycle controller over a fresh SQLite store and the given
/// mock gateway.
pub async fn build_lifecycle(gateway: Arc<MockGateway>) -> (TempDir, Arc<SqliteStore>, Lifecycle) {
    let temp = tempfile::tempdir().unwrap();
    let store = Arc::new(
        SqliteStore::new(temp.path().join("coordination.db"))
            .await
            .unwrap(),
    );
    let lifecycle = Lifecycle::new(store.clone(), gateway, WorkerConfig::default());
    (temp, store, lifecycle)
}

pub fn site(name: &str) -> SiteName {
    SiteName::parse(name).unwrap()
}

pub fn owner() -> UserId {
    UserId::parse("u1@example.com").unwrap()
}

/// Seed a bare site record owned by `user`.
pub async fn seed_site(store: &SqliteStore, site: &SiteName, user: &UserId) {
    store
        .create_site(site, &SiteRecord::with_owner(user))
        .await
        .unwrap();
}

//! Provisioning pipeline tests against the real SQLite store and a
//! call-recording mock gateway.

mod common;

use common::{MockGateway, build_lifecycle, owner, seed_site, site};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use steward_coordination::{BillingRepo, SiteRepo};
use steward_core::UserId;
use steward_lifecycle::{ProvisionOutcome, ProvisioningError};

#[tokio::test]
async fn provision_fresh_site_end_to_end() {
    let gateway = Arc::new(MockGateway::new());
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;

    let outcome = lifecycle.provision(&acme, &owner()).await.unwrap();
    let key = match outcome {
        ProvisionOutcome::Provisioned(key) => key,
        other => panic!("unexpected outcome: {other:?}"),
    };

    // Every stage ran, in order.
    assert_eq!(
        gateway.calls(),
        vec!["exists:acme", "create:acme", "acl:acme", "index:acme"]
    );
    assert!(gateway.has_bucket("acme"));

    // The credential and billing record were committed.
    let record = store.get_site(&acme).await.unwrap().unwrap();
    assert_eq!(record.key, Some(key));
    assert!(!record.error);

    let billing = store.get_billing(&acme).await.unwrap().unwrap();
    assert_eq!(billing.plan_id, "mainplan");
    assert_eq!(billing.email, "u1@example.com");
    assert_eq!(billing.status, "paid");
    assert!(billing.active);
    assert!(billing.end_trial > 0);
}

#[tokio::test]
async fn provision_twice_is_idempotent() {
    let gateway = Arc::new(MockGateway::new());
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;

    let first = lifecycle.provision(&acme, &owner()).await.unwrap();
    let key = match first {
        ProvisionOutcome::Provisioned(key) => key,
        other => panic!("unexpected outcome: {other:?}"),
    };
    let calls_after_first = gateway.calls().len();

    // The replayed command is a no-op success: no further gateway calls and
    // the original credential survives.
    let second = lifecycle.provision(&acme, &owner()).await.unwrap();
    assert_eq!(second, ProvisionOutcome::AlreadyProvisioned);
    assert_eq!(gateway.calls().len(), calls_after_first);

    let record = store.get_site(&acme).await.unwrap().unwrap();
    assert_eq!(record.key, Some(key));
}

#[tokio::test]
async fn provision_preserves_preexisting_key() {
    let gateway = Arc::new(MockGateway::new());
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;
    let abc = steward_core::SiteKey::parse("abc").unwrap();
    store.set_site_key(&acme, &abc).await.unwrap();

    let outcome = lifecycle.provision(&acme, &owner()).await.unwrap();
    assert_eq!(outcome, ProvisionOutcome::AlreadyProvisioned);
    assert!(gateway.calls().is_empty());

    let record = store.get_site(&acme).await.unwrap().unwrap();
    assert_eq!(record.key, Some(abc));
}

#[tokio::test]
async fn provision_rejects_non_owner_without_mutation() {
    let gateway = Arc::new(MockGateway::new());
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;
    // A previous failed run left the error flag set; an unauthorized call
    // must not touch it.
    store.set_error_flag(&acme, true).await.unwrap();

    let stranger = UserId::parse("stranger@example.com").unwrap();
    match lifecycle.provision(&acme, &stranger).await {
        Err(ProvisioningError::Unauthorized { .. }) => {}
        other => panic!("unexpected result: {other:?}"),
    }

    assert!(gateway.calls().is_empty());
    let record = store.get_site(&acme).await.unwrap().unwrap();
    assert!(record.key.is_none());
    assert!(record.error);
}

#[tokio::test]
async fn provision_unknown_site_fails() {
    let gateway = Arc::new(MockGateway::new());
    let (_temp, _store, lifecycle) = build_lifecycle(gateway.clone()).await;

    match lifecycle.provision(&site("ghost"), &owner()).await {
        Err(ProvisioningError::SiteNotFound(name)) => assert_eq!(name.as_str(), "ghost"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn existing_bucket_skips_create_stage() {
    let gateway = Arc::new(MockGateway::with_bucket("acme"));
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;

    lifecycle.provision(&acme, &owner()).await.unwrap();

    // The bucket was created out-of-band: no create call, but the
    // configuration and key-commit stages still run.
    assert_eq!(
        gateway.calls(),
        vec!["exists:acme", "acl:acme", "index:acme"]
    );
    let record = store.get_site(&acme).await.unwrap().unwrap();
    assert!(record.key.is_some());
}

#[tokio::test]
async fn lookup_failure_is_treated_as_not_found() {
    let gateway = Arc::new(MockGateway::new());
    gateway.fail_lookup.store(true, Ordering::SeqCst);
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;

    // The lookup error is swallowed and the pipeline proceeds to create.
    lifecycle.provision(&acme, &owner()).await.unwrap();
    assert_eq!(
        gateway.calls(),
        vec!["exists:acme", "create:acme", "acl:acme", "index:acme"]
    );
}

#[tokio::test]
async fn bucket_create_failure_aborts_pipeline() {
    let gateway = Arc::new(MockGateway::new());
    gateway.fail_create.store(true, Ordering::SeqCst);
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;

    match lifecycle.provision(&acme, &owner()).await {
        Err(ProvisioningError::BucketCreate { bucket, .. }) => assert_eq!(bucket, "acme"),
        other => panic!("unexpected result: {other:?}"),
    }

    // The remaining stages never ran and no credential was committed.
    assert_eq!(gateway.calls(), vec!["exists:acme", "create:acme"]);
    let record = store.get_site(&acme).await.unwrap().unwrap();
    assert!(record.key.is_none());
    assert!(store.get_billing(&acme).await.unwrap().is_none());
}

#[tokio::test]
async fn acl_failure_aborts_before_key_commit() {
    let gateway = Arc::new(MockGateway::new());
    gateway.fail_acl.store(true, Ordering::SeqCst);
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;

    match lifecycle.provision(&acme, &owner()).await {
        Err(ProvisioningError::AclUpdate { .. }) => {}
        other => panic!("unexpected result: {other:?}"),
    }

    assert_eq!(
        gateway.calls(),
        vec!["exists:acme", "create:acme", "acl:acme"]
    );
    let record = store.get_site(&acme).await.unwrap().unwrap();
    assert!(record.key.is_none());
}

#[tokio::test]
async fn index_failure_aborts_before_key_commit() {
    let gateway = Arc::new(MockGateway::new());
    gateway.fail_index.store(true, Ordering::SeqCst);
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;

    match lifecycle.provision(&acme, &owner()).await {
        Err(ProvisioningError::IndexUpdate { .. }) => {}
        other => panic!("unexpected result: {other:?}"),
    }

    let record = store.get_site(&acme).await.unwrap().unwrap();
    assert!(record.key.is_none());
}

#[tokio::test]
async fn provision_clears_error_flag_after_preconditions() {
    let gateway = Arc::new(MockGateway::new());
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let acme = site("acme");
    seed_site(&store, &acme, &owner()).await;
    store.set_error_flag(&acme, true).await.unwrap();

    lifecycle.provision(&acme, &owner()).await.unwrap();

    let record = store.get_site(&acme).await.unwrap().unwrap();
    assert!(!record.error);
}

#[tokio::test]
async fn provision_escaped_site_uses_unescaped_bucket_name() {
    let gateway = Arc::new(MockGateway::new());
    let (_temp, store, lifecycle) = build_lifecycle(gateway.clone()).await;
    let dotted = steward_core::SiteName::from_bucket("commencement.risd.edu").unwrap();
    seed_site(&store, &dotted, &owner()).await;

    lifecycle.provision(&dotted, &owner()).await.unwrap();

    assert!(gateway.has_bucket("commencement.risd.edu"));
    assert_eq!(gateway.calls()[0], "exists:commencement.risd.edu");
}

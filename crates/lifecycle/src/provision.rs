//! The site provisioning pipeline.
//!
//! One incoming "create" command becomes one [`ProvisioningRow`] advanced
//! through a fixed stage order: bucket lookup, bucket create, ACL update,
//! website index update, key commit. A stage whose precondition is already
//! satisfied passes the row through unchanged, which is what makes the
//! pipeline safe to re-run against a site whose bucket was created
//! out-of-band. Stage order is fixed: ACL and index configuration are
//! meaningless before the bucket exists, and the credential must not be
//! committed before the bucket is fully configured, since the credential is
//! the signal that the site is ready.

use crate::Lifecycle;
use steward_coordination::models::{BillingRecord, epoch_millis};
use steward_coordination::{BillingRepo, CoordinationError, SiteRepo};
use steward_core::{SiteKey, SiteName, UserId};
use steward_gateway::GatewayError;
use thiserror::Error;
use time::OffsetDateTime;

/// Provisioning pipeline errors.
///
/// The first two reject the command before any mutation; the stage variants
/// abort the pipeline mid-run. The surrounding intake adapter is responsible
/// for marking the site's error flag on a stage abort.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("site not found: {0}")]
    SiteNotFound(SiteName),

    #[error("user {user} is not an owner of site {site}")]
    Unauthorized { site: SiteName, user: UserId },

    #[error("coordination store error for site {site}: {source}")]
    Store {
        site: SiteName,
        #[source]
        source: CoordinationError,
    },

    #[error("bucket create failed for {bucket}: {source}")]
    BucketCreate {
        bucket: String,
        #[source]
        source: GatewayError,
    },

    #[error("ACL update failed for {bucket}: {source}")]
    AclUpdate {
        bucket: String,
        #[source]
        source: GatewayError,
    },

    #[error("website index update failed for {bucket}: {source}")]
    IndexUpdate {
        bucket: String,
        #[source]
        source: GatewayError,
    },

    #[error("key commit failed for site {site}: {source}")]
    KeyCommit {
        site: SiteName,
        #[source]
        source: CoordinationError,
    },
}

/// Outcome of a provisioning run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The site was provisioned and this credential committed.
    Provisioned(SiteKey),
    /// The site already held a credential; the command was a duplicate and
    /// nothing was mutated.
    AlreadyProvisioned,
}

/// The transient unit of work carried through the pipeline.
///
/// Once `bucket_exists` is true it is never reset within a run; every stage
/// after bucket confirmation is conditioned on it. The row is discarded when
/// the pipeline ends, success or failure.
#[derive(Clone, Debug)]
pub struct ProvisioningRow {
    /// Path-safe site identifier.
    pub site_name: SiteName,
    /// Storage-facing bucket name.
    pub site_bucket: String,
    /// Whether the bucket is known to exist.
    pub bucket_exists: bool,
    /// Pre-generated candidate credential.
    pub site_key: SiteKey,
}

impl ProvisioningRow {
    /// Build a fresh row for a site, generating its candidate credential.
    pub fn new(site_name: SiteName) -> Self {
        let site_bucket = site_name.bucket_name();
        Self {
            site_name,
            site_bucket,
            bucket_exists: false,
            site_key: SiteKey::generate(),
        }
    }
}

impl Lifecycle {
    /// Provision a site on behalf of a requesting user.
    ///
    /// Preconditions are checked before any mutation: the site record must
    /// exist, a site that already holds a key is an idempotent no-op, and the
    /// requester must be an owner. After preconditions pass, the site's
    /// error flag is cleared and the row runs the stage sequence. On abort
    /// nothing is rolled back; retries rely on each stage re-checking its
    /// precondition.
    pub async fn provision(
        &self,
        site: &SiteName,
        user: &UserId,
    ) -> Result<ProvisionOutcome, ProvisioningError> {
        let record = self
            .store()
            .get_site(site)
            .await
            .map_err(|source| ProvisioningError::Store {
                site: site.clone(),
                source,
            })?
            .ok_or_else(|| ProvisioningError::SiteNotFound(site.clone()))?;

        if record.key.is_some() {
            tracing::info!(site = %site, "site already has a key, duplicate create command");
            return Ok(ProvisionOutcome::AlreadyProvisioned);
        }

        if !record.is_owner(user) {
            return Err(ProvisioningError::Unauthorized {
                site: site.clone(),
                user: user.clone(),
            });
        }

        // Preconditions passed; clear the failure marker before setup so the
        // dashboard reflects the in-flight attempt.
        self.store()
            .set_error_flag(site, false)
            .await
            .map_err(|source| ProvisioningError::Store {
                site: site.clone(),
                source,
            })?;

        let mut row = ProvisioningRow::new(site.clone());
        tracing::info!(site = %row.site_name, bucket = %row.site_bucket, "setting up site");

        self.lookup_bucket(&mut row).await;
        self.create_bucket(&mut row).await?;
        self.update_acl(&row).await?;
        self.update_index(&row).await?;
        self.commit_key(&row, user).await?;

        tracing::info!(site = %row.site_name, "site provisioned");
        Ok(ProvisionOutcome::Provisioned(row.site_key))
    }

    /// Stage: query the gateway for bucket existence.
    ///
    /// Lookup errors are treated as "not found", never fatal; a bucket that
    /// genuinely cannot be reached fails loudly in the create stage instead.
    async fn lookup_bucket(&self, row: &mut ProvisioningRow) {
        tracing::debug!(bucket = %row.site_bucket, "site-setup: bucket lookup");
        match self.gateway().bucket_exists(&row.site_bucket).await {
            Ok(exists) => row.bucket_exists = exists,
            Err(error) => {
                tracing::debug!(bucket = %row.site_bucket, %error, "site-setup: bucket lookup failed");
            }
        }
    }

    /// Stage: create the bucket when the lookup did not find one.
    async fn create_bucket(&self, row: &mut ProvisioningRow) -> Result<(), ProvisioningError> {
        if row.bucket_exists {
            return Ok(());
        }

        tracing::debug!(bucket = %row.site_bucket, "site-setup: create bucket");
        self.gateway()
            .create_bucket(&row.site_bucket)
            .await
            .map_err(|source| ProvisioningError::BucketCreate {
                bucket: row.site_bucket.clone(),
                source,
            })?;
        row.bucket_exists = true;
        Ok(())
    }

    /// Stage: apply the public-read ACL policy.
    async fn update_acl(&self, row: &ProvisioningRow) -> Result<(), ProvisioningError> {
        if !row.bucket_exists {
            return Ok(());
        }

        tracing::debug!(bucket = %row.site_bucket, "site-setup: update acls");
        self.gateway()
            .set_acl(&row.site_bucket)
            .await
            .map_err(|source| ProvisioningError::AclUpdate {
                bucket: row.site_bucket.clone(),
                source,
            })
    }

    /// Stage: configure the website index and error documents.
    async fn update_index(&self, row: &ProvisioningRow) -> Result<(), ProvisioningError> {
        if !row.bucket_exists {
            return Ok(());
        }

        tracing::debug!(bucket = %row.site_bucket, "site-setup: update index");
        self.gateway()
            .set_website_index(
                &row.site_bucket,
                &self.config().index_document,
                &self.config().error_document,
            )
            .await
            .map_err(|source| ProvisioningError::IndexUpdate {
                bucket: row.site_bucket.clone(),
                source,
            })
    }

    /// Stage: commit the credential and write the billing record.
    ///
    /// The key write is the signal that the site is ready, so it runs last.
    async fn commit_key(
        &self,
        row: &ProvisioningRow,
        user: &UserId,
    ) -> Result<(), ProvisioningError> {
        if !row.bucket_exists || row.site_key.as_str().is_empty() {
            return Ok(());
        }

        tracing::debug!(site = %row.site_name, "site-setup: commit key");
        self.store()
            .set_site_key(&row.site_name, &row.site_key)
            .await
            .map_err(|source| ProvisioningError::KeyCommit {
                site: row.site_name.clone(),
                source,
            })?;

        // Billing info is not used by self-hosted deployments, but required
        // for the dashboard to treat the site as active.
        let billing = BillingRecord {
            plan_id: self.config().plan_id.clone(),
            email: user.as_str().to_string(),
            status: "paid".to_string(),
            active: true,
            end_trial: epoch_millis(OffsetDateTime::now_utc()),
        };
        self.store()
            .set_billing(&row.site_name, &billing)
            .await
            .map_err(|source| ProvisioningError::KeyCommit {
                site: row.site_name.clone(),
                source,
            })
    }
}

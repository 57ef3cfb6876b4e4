//! The fleet-wide credential rotation protocol.
//!
//! Every site holding a current credential gets a fresh one; the data keyed
//! by the old credential is migrated to the new key, the old key's data is
//! retired, and the new key is committed to the site record. Each site's
//! outcome is tracked independently: a sub-step failure is recorded in the
//! site's [`RotationRecord`], never thrown, so one bad site cannot block the
//! rest of the batch and the operator gets a complete audit in one pass.

use crate::Lifecycle;
use steward_coordination::{CoordinationError, SiteDataRepo, SiteRepo};
use steward_core::{SiteKey, SiteName};
use thiserror::Error;

/// Fatal rotation errors.
///
/// Only the initial fleet enumeration can fail the whole invocation;
/// per-site failures live in the returned records.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("fleet enumeration failed: {0}")]
    Enumeration(#[source] CoordinationError),
}

/// Per-site audit record for one rotation invocation.
///
/// A `None` flag means the sub-step was not attempted: either the site had no
/// current credential (nothing to rotate), or an earlier sub-step halted the
/// record. `removed_old_data` can only be `Some(true)` when `migrated_data`
/// is `Some(true)` — old data is never deleted before a successful migration.
#[derive(Clone, Debug)]
pub struct RotationRecord {
    /// Path-safe site identifier.
    pub site_name: SiteName,
    /// The credential being replaced, absent for never-provisioned sites.
    pub current_key: Option<SiteKey>,
    /// The freshly generated replacement credential.
    pub new_key: SiteKey,
    /// Whether credential-keyed data was copied under the new key.
    pub migrated_data: Option<bool>,
    /// Whether the old key's data was deleted.
    pub removed_old_data: Option<bool>,
    /// Whether the new key was committed to the site record.
    pub new_key_set: Option<bool>,
}

impl RotationRecord {
    fn new(site_name: SiteName, current_key: Option<SiteKey>) -> Self {
        Self {
            site_name,
            current_key,
            new_key: SiteKey::generate(),
            migrated_data: None,
            removed_old_data: None,
            new_key_set: None,
        }
    }

    /// Whether the site was skipped for lack of a current credential.
    pub fn skipped(&self) -> bool {
        self.current_key.is_none()
    }

    /// Whether every sub-step completed successfully.
    pub fn completed(&self) -> bool {
        self.migrated_data == Some(true)
            && self.removed_old_data == Some(true)
            && self.new_key_set == Some(true)
    }
}

impl Lifecycle {
    /// Rotate every site's access credential.
    ///
    /// Returns one record per enumerated site — including skipped and failed
    /// ones — so a fleet of N sites always yields exactly N records. Fails
    /// only if the fleet enumeration itself fails; no records are produced
    /// in that case.
    pub async fn rotate_all(&self) -> Result<Vec<RotationRecord>, RotationError> {
        let sites = self
            .store()
            .list_sites()
            .await
            .map_err(RotationError::Enumeration)?;

        let mut records: Vec<RotationRecord> = sites
            .into_iter()
            .map(|(site_name, record)| RotationRecord::new(site_name, record.key))
            .collect();

        tracing::info!(sites = records.len(), "rotating fleet credentials");

        // Strictly sequential: bounds load on the shared coordination and
        // storage services and keeps per-site bookkeeping deterministic.
        for record in &mut records {
            if record.current_key.is_none() {
                tracing::debug!(site = %record.site_name, "no current key, nothing to rotate");
                continue;
            }
            self.rotate_site(record).await;
        }

        Ok(records)
    }

    /// Run the three ordered sub-steps for one eligible record.
    ///
    /// Failures are captured into the record. A migrate that cannot read the
    /// current data halts the record: there is nothing to move, and
    /// committing a credential that points at nothing would orphan the site.
    async fn rotate_site(&self, record: &mut RotationRecord) {
        let current = match record.current_key.clone() {
            Some(key) => key,
            None => return,
        };

        // migrate
        let data = match self
            .store()
            .read_site_data(&record.site_name, &current)
            .await
        {
            Ok(Some(data)) => data,
            Ok(None) => {
                record.migrated_data = Some(false);
                tracing::warn!(
                    site = %record.site_name,
                    "no data under current key; the site's data was likely removed but not \
                     its management entry, which should likely be fully deleted"
                );
                return;
            }
            Err(error) => {
                record.migrated_data = Some(false);
                tracing::warn!(site = %record.site_name, %error, "reading site data failed");
                return;
            }
        };

        match self
            .store()
            .write_site_data(&record.site_name, &record.new_key, &data)
            .await
        {
            Ok(()) => record.migrated_data = Some(true),
            Err(error) => {
                record.migrated_data = Some(false);
                tracing::warn!(site = %record.site_name, %error, "migrating site data failed");
            }
        }

        // retire: never delete before a successful migration
        if record.migrated_data == Some(true) {
            record.removed_old_data = Some(
                match self
                    .store()
                    .delete_site_data(&record.site_name, &current)
                    .await
                {
                    Ok(()) => true,
                    Err(error) => {
                        tracing::warn!(site = %record.site_name, %error, "retiring old site data failed");
                        false
                    }
                },
            );
        }

        // commit
        record.new_key_set = Some(
            match self
                .store()
                .set_site_key(&record.site_name, &record.new_key)
                .await
            {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(site = %record.site_name, %error, "committing new key failed");
                    false
                }
            },
        );

        tracing::debug!(
            site = %record.site_name,
            migrated = ?record.migrated_data,
            removed = ?record.removed_old_data,
            committed = ?record.new_key_set,
            "site rotation finished"
        );
    }
}

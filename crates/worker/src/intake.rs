//! Mapping inbound commands onto the lifecycle protocols.

use std::collections::HashMap;
use std::sync::Arc;
use steward_coordination::models::SiteMessage;
use steward_coordination::{CoordinationStore, SiteRepo};
use steward_core::{SiteName, UserId};
use steward_lifecycle::{
    Lifecycle, ProvisionOutcome, ProvisioningError, RotationError, RotationRecord,
};
use tokio::sync::Mutex;

/// Status message code for provisioning outcomes.
const CREATE_CODE: &str = "SITE_CREATE";

/// A "create site" command from the dispatch transport.
#[derive(Clone, Debug)]
pub struct CreateCommand {
    /// Requesting user.
    pub user_id: UserId,
    /// Site to provision, in path-safe form.
    pub site_name: SiteName,
}

/// Terminal job status reported at acknowledgment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    /// The work was done, or was an idempotent no-op on an
    /// already-provisioned site.
    Completed,
    /// Another job for the same identifier is in flight; acknowledged as a
    /// no-op rather than racing it.
    Duplicate,
    /// Rejected before any mutation: unknown site or unauthorized user.
    Rejected,
    /// A stage aborted; the site's error flag is set. The job is not
    /// re-queued — the pipeline is idempotent and the operator re-triggers.
    Failed,
}

impl JobStatus {
    /// Whether the job left the system in the requested state.
    pub fn is_success(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Duplicate)
    }
}

/// Result of a fleet rotation job: the acknowledgment status plus the
/// per-site audit records for the operator.
#[derive(Debug)]
pub struct RotationOutcome {
    pub status: JobStatus,
    pub records: Vec<RotationRecord>,
}

/// The job intake adapter.
///
/// Holds the per-site single-flight locks for provisioning and the
/// invocation-level lock for rotation. Handlers never propagate errors past
/// the acknowledgment boundary; every command produces a [`JobStatus`].
pub struct JobIntake {
    lifecycle: Arc<Lifecycle>,
    store: Arc<dyn CoordinationStore>,
    site_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    rotation_lock: Mutex<()>,
}

impl JobIntake {
    /// Create an intake adapter over the lifecycle controller.
    pub fn new(lifecycle: Arc<Lifecycle>, store: Arc<dyn CoordinationStore>) -> Self {
        Self {
            lifecycle,
            store,
            site_locks: Mutex::new(HashMap::new()),
            rotation_lock: Mutex::new(()),
        }
    }

    /// Handle a "create site" command.
    ///
    /// At most one run per site identifier is in flight at a time; a
    /// duplicate arriving mid-run is acknowledged as a no-op. The run itself
    /// completes (success or abort) before this returns — there is no
    /// mid-pipeline cancellation.
    pub async fn handle_create(&self, command: CreateCommand) -> JobStatus {
        let lock = self.site_lock(&command.site_name).await;
        let _guard = match lock.try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::info!(
                    site = %command.site_name,
                    "create already in flight for this site, acknowledging as no-op"
                );
                return JobStatus::Duplicate;
            }
        };

        tracing::info!(site = %command.site_name, user = %command.user_id, "processing create command");
        self.run_create(&command).await
    }

    /// Handle a fleet rotation invocation.
    ///
    /// Rotation is single-flight at the invocation level: two concurrent
    /// invocations on the same fleet are not safe, so a second one is
    /// acknowledged as a duplicate no-op.
    pub async fn handle_rotate(&self) -> RotationOutcome {
        let _guard = match self.rotation_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::info!("rotation already in flight, acknowledging as no-op");
                return RotationOutcome {
                    status: JobStatus::Duplicate,
                    records: Vec::new(),
                };
            }
        };

        match self.lifecycle.rotate_all().await {
            Ok(records) => {
                let skipped = records.iter().filter(|r| r.skipped()).count();
                let completed = records.iter().filter(|r| r.completed()).count();
                let failed = records.len() - skipped - completed;
                tracing::info!(
                    sites = records.len(),
                    completed,
                    skipped,
                    failed,
                    "fleet rotation finished"
                );
                RotationOutcome {
                    status: JobStatus::Completed,
                    records,
                }
            }
            Err(RotationError::Enumeration(error)) => {
                tracing::error!(%error, "fleet enumeration failed, no sites rotated");
                RotationOutcome {
                    status: JobStatus::Failed,
                    records: Vec::new(),
                }
            }
        }
    }

    async fn run_create(&self, command: &CreateCommand) -> JobStatus {
        match self
            .lifecycle
            .provision(&command.site_name, &command.user_id)
            .await
        {
            Ok(ProvisionOutcome::Provisioned(_)) => {
                // Bookkeeping failures are logged but do not fail the job:
                // the site itself is provisioned.
                if let Err(error) = self
                    .store
                    .add_owner_backlink(&command.user_id, &command.site_name)
                    .await
                {
                    tracing::warn!(site = %command.site_name, %error, "owner backlink write failed");
                }
                self.push_message(&command.site_name, "site created", 0)
                    .await;
                tracing::info!(site = %command.site_name, "done creating site");
                JobStatus::Completed
            }
            Ok(ProvisionOutcome::AlreadyProvisioned) => {
                tracing::info!(site = %command.site_name, "site already has key");
                JobStatus::Completed
            }
            Err(
                error @ (ProvisioningError::SiteNotFound(_) | ProvisioningError::Unauthorized { .. }),
            ) => {
                tracing::warn!(site = %command.site_name, %error, "site does not exist or no permissions");
                JobStatus::Rejected
            }
            Err(error) => {
                tracing::error!(site = %command.site_name, %error, "error creating site");
                if let Err(flag_error) = self.store.set_error_flag(&command.site_name, true).await {
                    tracing::error!(site = %command.site_name, error = %flag_error, "failed to mark site error flag");
                }
                self.push_message(
                    &command.site_name,
                    &format!("site creation failed: {error}"),
                    1,
                )
                .await;
                JobStatus::Failed
            }
        }
    }

    /// Push a status message for the dashboard; failures must not break the
    /// acknowledgment path, so they are only logged.
    async fn push_message(&self, site: &SiteName, message: &str, status: i64) {
        let message = SiteMessage::now(message, status, CREATE_CODE);
        if let Err(error) = self.store.push_site_message(site, &message).await {
            tracing::warn!(site = %site, %error, "status message write failed");
        }
    }

    async fn site_lock(&self, site: &SiteName) -> Arc<Mutex<()>> {
        let mut locks = self.site_locks.lock().await;
        locks
            .entry(site.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

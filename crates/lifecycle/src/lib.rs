//! Site lifecycle controller: provisioning and credential rotation.
//!
//! The two protocols in this crate are the only stateful workflows in the
//! system:
//! - [`Lifecycle::provision`] drives a bare site record through the ordered,
//!   idempotent stages that leave it storage-backed and credentialed.
//! - [`Lifecycle::rotate_all`] replaces every site's access credential across
//!   the fleet, migrating credential-keyed data and auditing each site's
//!   outcome independently.
//!
//! Both operate over an explicit dependency pair (coordination store +
//! storage gateway); the controller keeps no persistent state of its own
//! between invocations.

pub mod provision;
pub mod rotate;

pub use provision::{ProvisionOutcome, ProvisioningError, ProvisioningRow};
pub use rotate::{RotationError, RotationRecord};

use std::sync::Arc;
use steward_coordination::CoordinationStore;
use steward_core::config::WorkerConfig;
use steward_gateway::BucketGateway;

/// The site lifecycle controller and its collaborators.
pub struct Lifecycle {
    store: Arc<dyn CoordinationStore>,
    gateway: Arc<dyn BucketGateway>,
    config: WorkerConfig,
}

impl Lifecycle {
    /// Create a controller over the given collaborators.
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        gateway: Arc<dyn BucketGateway>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    pub(crate) fn store(&self) -> &dyn CoordinationStore {
        self.store.as_ref()
    }

    pub(crate) fn gateway(&self) -> &dyn BucketGateway {
        self.gateway.as_ref()
    }

    pub(crate) fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

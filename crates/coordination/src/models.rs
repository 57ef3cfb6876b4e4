//! Record types stored in the coordination tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use steward_core::SiteKey;
use time::OffsetDateTime;

/// A site record at `management/sites/{site}`.
///
/// `owners` maps the escaped user id to the raw user id, mirroring how the
/// dashboard writes owner entries. Presence of `key` marks the site
/// provisioned.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Escaped user id -> raw user id.
    #[serde(default)]
    pub owners: BTreeMap<String, String>,
    /// Current access credential, if provisioned.
    #[serde(default)]
    pub key: Option<SiteKey>,
    /// Provisioning-failure marker, consumed by the operator dashboard.
    #[serde(default)]
    pub error: bool,
    /// Bounded status log, most recent last.
    #[serde(default)]
    pub messages: Vec<SiteMessage>,
}

impl SiteRecord {
    /// Create a record owned by a single user.
    pub fn with_owner(user: &steward_core::UserId) -> Self {
        let mut owners = BTreeMap::new();
        owners.insert(user.escaped(), user.as_str().to_string());
        Self {
            owners,
            ..Self::default()
        }
    }

    /// Check whether a user is an owner of this site.
    pub fn is_owner(&self, user: &steward_core::UserId) -> bool {
        self.owners.contains_key(&user.escaped())
    }
}

/// A status message on a site record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteMessage {
    /// Human-readable message shown in the dashboard.
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// 0 for success, 1 for failure (command-line status convention).
    pub status: i64,
    /// Originating subsystem code, e.g. `SITE_CREATE`.
    pub code: String,
}

impl SiteMessage {
    /// Create a message stamped with the current time.
    pub fn now(message: impl Into<String>, status: i64, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: epoch_millis(OffsetDateTime::now_utc()),
            status,
            code: code.into(),
        }
    }
}

/// A billing record at `billing/sites/{site}`.
///
/// Field names follow the wire format consumed by the billing dashboard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingRecord {
    /// Billing plan id.
    #[serde(rename = "plan-id")]
    pub plan_id: String,
    /// Requester email (raw user id).
    pub email: String,
    /// Payment status.
    pub status: String,
    /// Whether the subscription is active.
    pub active: bool,
    /// Trial-start timestamp, epoch milliseconds.
    #[serde(rename = "endTrial")]
    pub end_trial: i64,
}

/// Convert a timestamp to epoch milliseconds.
pub fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

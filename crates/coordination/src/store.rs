//! Coordination store trait and SQLite implementation.

use crate::error::{CoordinationError, CoordinationResult};
use crate::models::{BillingRecord, SiteMessage, SiteRecord};
use crate::paths;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use steward_core::{MAX_SITE_MESSAGES, SiteKey, SiteName, UserId};
use time::OffsetDateTime;

/// Repository over site records at `management/sites/{site}`.
#[async_trait]
pub trait SiteRepo {
    /// Read a site record, if the site exists.
    async fn get_site(&self, site: &SiteName) -> CoordinationResult<Option<SiteRecord>>;

    /// Enumerate every site record, ordered by site name.
    async fn list_sites(&self) -> CoordinationResult<Vec<(SiteName, SiteRecord)>>;

    /// Create a site record. Fails if the site already exists.
    async fn create_site(&self, site: &SiteName, record: &SiteRecord) -> CoordinationResult<()>;

    /// Set the site's access credential.
    async fn set_site_key(&self, site: &SiteName, key: &SiteKey) -> CoordinationResult<()>;

    /// Set or clear the site's provisioning-failure marker.
    async fn set_error_flag(&self, site: &SiteName, error: bool) -> CoordinationResult<()>;

    /// Append a status message, trimming the log to the most recent
    /// [`MAX_SITE_MESSAGES`] entries.
    async fn push_site_message(
        &self,
        site: &SiteName,
        message: &SiteMessage,
    ) -> CoordinationResult<()>;

    /// Record site ownership under the user's record
    /// (`management/users/{user}/sites/owners/{site}`).
    async fn add_owner_backlink(&self, user: &UserId, site: &SiteName) -> CoordinationResult<()>;
}

/// Repository over billing records at `billing/sites/{site}`.
#[async_trait]
pub trait BillingRepo {
    /// Write the billing record for a site.
    async fn set_billing(&self, site: &SiteName, billing: &BillingRecord)
    -> CoordinationResult<()>;

    /// Read the billing record for a site.
    async fn get_billing(&self, site: &SiteName) -> CoordinationResult<Option<BillingRecord>>;
}

/// Repository over credential-keyed site data at `buckets/{site}/{key}/dev`.
#[async_trait]
pub trait SiteDataRepo {
    /// Read the data document keyed by a credential. `None` when no data
    /// exists under that key.
    async fn read_site_data(
        &self,
        site: &SiteName,
        key: &SiteKey,
    ) -> CoordinationResult<Option<serde_json::Value>>;

    /// Write the data document under a credential.
    async fn write_site_data(
        &self,
        site: &SiteName,
        key: &SiteKey,
        data: &serde_json::Value,
    ) -> CoordinationResult<()>;

    /// Delete the data document under a credential. Deleting an absent
    /// document succeeds.
    async fn delete_site_data(&self, site: &SiteName, key: &SiteKey) -> CoordinationResult<()>;
}

/// Combined coordination store trait.
#[async_trait]
pub trait CoordinationStore: SiteRepo + BillingRepo + SiteDataRepo + Send + Sync {
    /// Run schema migrations.
    async fn migrate(&self) -> CoordinationResult<()>;

    /// Check store connectivity and health.
    async fn health_check(&self) -> CoordinationResult<()>;
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    path       TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// SQLite-backed path-addressed coordination store.
///
/// One row per path; values are JSON documents. Record mutations are
/// read-modify-write inside a transaction, which preserves the
/// single-writer-per-path contract the controller relies on.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (or create) a SQLite coordination store.
    pub async fn new(path: impl AsRef<Path>) -> CoordinationResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoordinationError::Config(format!("create parent dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under worker concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!(path = %path.display(), "coordination store opened");
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn read_path(&self, path: &str) -> CoordinationResult<Option<serde_json::Value>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM records WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some((text,)) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn write_path(&self, path: &str, value: &serde_json::Value) -> CoordinationResult<()> {
        sqlx::query(
            r#"
            INSERT INTO records (path, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(path)
        .bind(serde_json::to_string(value)?)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_path(&self, path: &str) -> CoordinationResult<()> {
        sqlx::query("DELETE FROM records WHERE path = ?")
            .bind(path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Read-modify-write a site record inside one transaction.
    async fn update_site<F>(&self, site: &SiteName, mutate: F) -> CoordinationResult<()>
    where
        F: FnOnce(&mut SiteRecord) + Send,
    {
        let path = paths::site_record(site);
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM records WHERE path = ?")
            .bind(&path)
            .fetch_optional(&mut *tx)
            .await?;
        let text = match row {
            Some((text,)) => text,
            None => {
                return Err(CoordinationError::NotFound(format!("site {site} not found")));
            }
        };

        let mut record: SiteRecord = serde_json::from_str(&text)?;
        mutate(&mut record);

        sqlx::query("UPDATE records SET value = ?, updated_at = ? WHERE path = ?")
            .bind(serde_json::to_string(&record)?)
            .bind(OffsetDateTime::now_utc())
            .bind(&path)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CoordinationStore for SqliteStore {
    async fn migrate(&self) -> CoordinationResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> CoordinationResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SiteRepo for SqliteStore {
    async fn get_site(&self, site: &SiteName) -> CoordinationResult<Option<SiteRecord>> {
        match self.read_path(&paths::site_record(site)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn list_sites(&self) -> CoordinationResult<Vec<(SiteName, SiteRecord)>> {
        // Site records are exactly one path level below the prefix; deeper
        // rows (none today) and sibling trees must not leak into the fleet
        // enumeration.
        let prefix = format!("{}/", paths::SITES_PREFIX);
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT path, value FROM records WHERE path LIKE ? AND path NOT LIKE ? ORDER BY path",
        )
        .bind(format!("{prefix}%"))
        .bind(format!("{prefix}%/%"))
        .fetch_all(&self.pool)
        .await?;

        let mut sites = Vec::with_capacity(rows.len());
        for (path, text) in rows {
            let name = path.strip_prefix(&prefix).ok_or_else(|| {
                CoordinationError::Internal(format!("unexpected site path: {path}"))
            })?;
            let site = SiteName::parse(name)
                .map_err(|e| CoordinationError::Internal(format!("bad site path {path}: {e}")))?;
            let record: SiteRecord = serde_json::from_str(&text)?;
            sites.push((site, record));
        }
        Ok(sites)
    }

    async fn create_site(&self, site: &SiteName, record: &SiteRecord) -> CoordinationResult<()> {
        if self.get_site(site).await?.is_some() {
            return Err(CoordinationError::AlreadyExists(format!(
                "site {site} already exists"
            )));
        }
        self.write_path(&paths::site_record(site), &serde_json::to_value(record)?)
            .await
    }

    async fn set_site_key(&self, site: &SiteName, key: &SiteKey) -> CoordinationResult<()> {
        let key = key.clone();
        self.update_site(site, move |record| {
            record.key = Some(key);
        })
        .await
    }

    async fn set_error_flag(&self, site: &SiteName, error: bool) -> CoordinationResult<()> {
        self.update_site(site, move |record| {
            record.error = error;
        })
        .await
    }

    async fn push_site_message(
        &self,
        site: &SiteName,
        message: &SiteMessage,
    ) -> CoordinationResult<()> {
        let message = message.clone();
        self.update_site(site, move |record| {
            record.messages.push(message);
            if record.messages.len() > MAX_SITE_MESSAGES {
                let excess = record.messages.len() - MAX_SITE_MESSAGES;
                record.messages.drain(..excess);
            }
        })
        .await
    }

    async fn add_owner_backlink(&self, user: &UserId, site: &SiteName) -> CoordinationResult<()> {
        self.write_path(&paths::owner_backlink(user, site), &serde_json::Value::Bool(true))
            .await
    }
}

#[async_trait]
impl BillingRepo for SqliteStore {
    async fn set_billing(
        &self,
        site: &SiteName,
        billing: &BillingRecord,
    ) -> CoordinationResult<()> {
        self.write_path(&paths::billing_record(site), &serde_json::to_value(billing)?)
            .await
    }

    async fn get_billing(&self, site: &SiteName) -> CoordinationResult<Option<BillingRecord>> {
        match self.read_path(&paths::billing_record(site)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SiteDataRepo for SqliteStore {
    async fn read_site_data(
        &self,
        site: &SiteName,
        key: &SiteKey,
    ) -> CoordinationResult<Option<serde_json::Value>> {
        self.read_path(&paths::site_data(site, key)).await
    }

    async fn write_site_data(
        &self,
        site: &SiteName,
        key: &SiteKey,
        data: &serde_json::Value,
    ) -> CoordinationResult<()> {
        self.write_path(&paths::site_data(site, key), data).await
    }

    async fn delete_site_data(&self, site: &SiteName, key: &SiteKey) -> CoordinationResult<()> {
        self.delete_path(&paths::site_data(site, key)).await
    }
}

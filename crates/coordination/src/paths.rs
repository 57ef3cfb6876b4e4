//! Coordination store path layout.
//!
//! All identifiers embedded in paths are in their escaped (path-safe) form;
//! [`steward_core::SiteName`] and [`steward_core::UserId::escaped`] enforce
//! that.

use steward_core::{SiteKey, SiteName, UserId};

/// Prefix under which one record per site lives.
pub const SITES_PREFIX: &str = "management/sites";

/// Site record path: `management/sites/{site}`.
pub fn site_record(site: &SiteName) -> String {
    format!("{SITES_PREFIX}/{site}")
}

/// Billing record path: `billing/sites/{site}`.
pub fn billing_record(site: &SiteName) -> String {
    format!("billing/sites/{site}")
}

/// Credential-keyed site data path: `buckets/{site}/{key}/dev`.
pub fn site_data(site: &SiteName, key: &SiteKey) -> String {
    format!("buckets/{site}/{key}/dev")
}

/// Owner backlink path: `management/users/{user}/sites/owners/{site}`.
pub fn owner_backlink(user: &UserId, site: &SiteName) -> String {
    format!("management/users/{}/sites/owners/{site}", user.escaped())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_use_escaped_segments() {
        let site = SiteName::from_bucket("commencement.risd.edu").unwrap();
        let user = UserId::parse("owner@example.com").unwrap();
        let key = SiteKey::parse("d1b96975-edd0-4f8c-af62-cf05d134f28a").unwrap();

        assert_eq!(
            site_record(&site),
            "management/sites/commencement,1risd,1edu"
        );
        assert_eq!(billing_record(&site), "billing/sites/commencement,1risd,1edu");
        assert_eq!(
            site_data(&site, &key),
            "buckets/commencement,1risd,1edu/d1b96975-edd0-4f8c-af62-cf05d134f28a/dev"
        );
        assert_eq!(
            owner_backlink(&user, &site),
            "management/users/owner@example,1com/sites/owners/commencement,1risd,1edu"
        );
    }
}

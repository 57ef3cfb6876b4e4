//! Site access credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An opaque credential authorizing writes to a site's data.
///
/// The key is stored on the site record and doubles as a path component for
/// credential-keyed data, so it must stay free of the coordination store's
/// reserved characters. Freshly generated keys are UUID v4 strings.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteKey(String);

impl SiteKey {
    /// Generate a fresh random credential.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an existing credential value.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() {
            return Err(crate::Error::InvalidSiteKey("empty".to_string()));
        }
        if s.contains('/') || s.contains('.') {
            return Err(crate::Error::InvalidSiteKey(format!(
                "contains reserved characters: {s}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// The credential value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SiteKey({})", self.0)
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

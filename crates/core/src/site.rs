//! Site and user identity types.
//!
//! The coordination store reserves `.` in path segments, so identifiers that
//! may contain it (site names derived from domains, user ids that are email
//! addresses) are stored in an escaped form: each `.` is substituted with the
//! two-character marker `,1`. The substitution is deterministic and
//! reversible; the storage-facing bucket name is the unescaped form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker substituted for the reserved `.` separator in path segments.
const ESCAPE_MARKER: &str = ",1";

/// Escape a raw identifier for use as a coordination-store path segment.
pub fn escape_path_segment(raw: &str) -> String {
    raw.replace('.', ESCAPE_MARKER)
}

/// Reverse [`escape_path_segment`].
pub fn unescape_path_segment(escaped: &str) -> String {
    escaped.replace(ESCAPE_MARKER, ".")
}

/// A site identifier in path-safe (escaped) form.
///
/// Site names double as storage bucket names via [`SiteName::bucket_name`],
/// which reverses the escaping (`commencement,1risd,1systems` names the
/// bucket `commencement.risd.edu`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteName(String);

impl SiteName {
    /// Parse a path-safe site name.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() {
            return Err(crate::Error::InvalidSiteName("empty".to_string()));
        }
        if s.contains('/') || s.contains('.') {
            return Err(crate::Error::InvalidSiteName(format!(
                "contains reserved characters: {s}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Build a site name from a storage-facing bucket name, escaping the
    /// reserved separator.
    pub fn from_bucket(bucket: &str) -> crate::Result<Self> {
        Self::parse(&escape_path_segment(bucket))
    }

    /// The path-safe form, used as a coordination-store path segment.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The storage-facing bucket name (unescaped form).
    pub fn bucket_name(&self) -> String {
        unescape_path_segment(&self.0)
    }
}

impl fmt::Debug for SiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SiteName({})", self.0)
    }
}

impl fmt::Display for SiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user identifier in raw form (typically an email address).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse a raw user id.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() {
            return Err(crate::Error::InvalidUserId("empty".to_string()));
        }
        if s.contains('/') {
            return Err(crate::Error::InvalidUserId(format!(
                "contains path separator: {s}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// The raw form, used in billing records and mail.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The escaped form, used as a coordination-store path segment and as the
    /// key of a site record's owners map.
    pub fn escaped(&self) -> String {
        escape_path_segment(&self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

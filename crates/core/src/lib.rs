//! Core domain types and shared logic for the steward site lifecycle
//! controller.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Site and user identifiers with coordination-path escaping
//! - Site access credentials and their generation
//! - Shared configuration types

pub mod config;
pub mod error;
pub mod key;
pub mod site;

pub use config::{AppConfig, CoordinationConfig, GatewayConfig, WorkerConfig};
pub use error::{Error, Result};
pub use key::SiteKey;
pub use site::{SiteName, UserId, escape_path_segment, unescape_path_segment};

/// Maximum number of status messages retained per site record.
pub const MAX_SITE_MESSAGES: usize = 50;

//! Job intake adapter for the steward site lifecycle controller.
//!
//! The dispatch transport delivers each command exactly once; this crate
//! maps those commands onto the lifecycle protocols, guarantees at most one
//! in-flight run per site identifier, and always acknowledges — a job's
//! outcome is reported through [`intake::JobStatus`] and the site record's
//! error flag, never through a re-queue.

pub mod intake;

pub use intake::{CreateCommand, JobIntake, JobStatus, RotationOutcome};

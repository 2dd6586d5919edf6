//! Data models for the roster, the fleet and the missions.
//!
//! - `Pilot`, `PilotStatus`, `PilotFilter`: roster records and queries
//! - `Drone`, `DroneStatus`, `DroneFilter`: fleet records and queries
//! - `Project`, `DateRange`: mission requirements and schedules
//! - `Conflict`, `ConflictKind`, `ReassignmentBundle`: engine output

pub mod conflict;
pub mod drone;
pub mod pilot;
pub mod project;

pub use conflict::{Conflict, ConflictKind, MaintenanceReason, ReassignmentBundle};
pub use drone::{Drone, DroneFilter, DroneStatus};
pub use pilot::{Pilot, PilotFilter, PilotStatus};
pub use project::{DateRange, Project};

/// Lowercase, trim, and fold `_`/`-` into single spaces so that
/// "on_leave", "On-Leave" and " on  leave " all read the same.
pub(crate) fn normalize_status(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

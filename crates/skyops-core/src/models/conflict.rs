use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Drone, Pilot};
use crate::error::EntityKind;
use crate::utils::ids_match;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    DoubleBooking,
    SkillCertMismatch,
    DroneMaintenance,
    LocationMismatch,
    PilotDroneLocationMismatch,
    DanglingAssignment,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::DoubleBooking => write!(f, "Double booking"),
            ConflictKind::SkillCertMismatch => write!(f, "Skill/cert mismatch"),
            ConflictKind::DroneMaintenance => write!(f, "Drone in maintenance but assigned"),
            ConflictKind::LocationMismatch => write!(f, "Pilot-project location mismatch"),
            ConflictKind::PilotDroneLocationMismatch => write!(f, "Pilot and drone in different locations"),
            ConflictKind::DanglingAssignment => write!(f, "Assignment to unknown project"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceReason {
    InMaintenance,
    Overdue,
}

/// One detected violation. Records only carry ids and the facts that
/// make up the violation; rendering is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    DoubleBooking {
        pilot_id: String,
        pilot_name: String,
        project_ids: Vec<String>,
    },
    SkillCertMismatch {
        pilot_id: String,
        pilot_name: String,
        project_id: String,
        missing_skills: Vec<String>,
        missing_certs: Vec<String>,
    },
    DroneMaintenance {
        drone_id: String,
        project_id: String,
        reason: MaintenanceReason,
        maintenance_due: Option<NaiveDate>,
    },
    LocationMismatch {
        pilot_id: String,
        pilot_name: String,
        pilot_location: String,
        project_id: String,
        project_location: String,
    },
    PilotDroneLocationMismatch {
        pilot_id: String,
        pilot_location: String,
        drone_id: String,
        drone_location: String,
        project_id: String,
    },
    DanglingAssignment {
        holder: EntityKind,
        holder_id: String,
        project_id: String,
    },
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match self {
            Conflict::DoubleBooking { .. } => ConflictKind::DoubleBooking,
            Conflict::SkillCertMismatch { .. } => ConflictKind::SkillCertMismatch,
            Conflict::DroneMaintenance { .. } => ConflictKind::DroneMaintenance,
            Conflict::LocationMismatch { .. } => ConflictKind::LocationMismatch,
            Conflict::PilotDroneLocationMismatch { .. } => ConflictKind::PilotDroneLocationMismatch,
            Conflict::DanglingAssignment { .. } => ConflictKind::DanglingAssignment,
        }
    }

    pub fn project_ids(&self) -> Vec<&str> {
        match self {
            Conflict::DoubleBooking { project_ids, .. } => {
                project_ids.iter().map(String::as_str).collect()
            }
            Conflict::SkillCertMismatch { project_id, .. }
            | Conflict::DroneMaintenance { project_id, .. }
            | Conflict::LocationMismatch { project_id, .. }
            | Conflict::PilotDroneLocationMismatch { project_id, .. }
            | Conflict::DanglingAssignment { project_id, .. } => vec![project_id.as_str()],
        }
    }

    pub fn pilot_id(&self) -> Option<&str> {
        match self {
            Conflict::DoubleBooking { pilot_id, .. }
            | Conflict::SkillCertMismatch { pilot_id, .. }
            | Conflict::LocationMismatch { pilot_id, .. }
            | Conflict::PilotDroneLocationMismatch { pilot_id, .. } => Some(pilot_id.as_str()),
            Conflict::DanglingAssignment {
                holder: EntityKind::Pilot,
                holder_id,
                ..
            } => Some(holder_id.as_str()),
            _ => None,
        }
    }

    pub fn drone_id(&self) -> Option<&str> {
        match self {
            Conflict::DroneMaintenance { drone_id, .. }
            | Conflict::PilotDroneLocationMismatch { drone_id, .. } => Some(drone_id.as_str()),
            Conflict::DanglingAssignment {
                holder: EntityKind::Drone,
                holder_id,
                ..
            } => Some(holder_id.as_str()),
            _ => None,
        }
    }

    pub fn names_project(&self, project_id: &str) -> bool {
        self.project_ids().iter().any(|p| ids_match(p, project_id))
    }

    /// Whether this record names the project or one of the pilots or
    /// drones currently committed to it.
    pub fn concerns(&self, project_id: &str, crew: &[&Pilot], drones: &[&Drone]) -> bool {
        self.names_project(project_id)
            || self
                .pilot_id()
                .map_or(false, |id| crew.iter().any(|p| ids_match(&p.pilot_id, id)))
            || self
                .drone_id()
                .map_or(false, |id| drones.iter().any(|d| ids_match(&d.drone_id, id)))
    }
}

/// Suggestions for staffing a project urgently. Never applied automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignmentBundle {
    pub project_id: String,
    pub reason: Option<String>,
    pub suggested_pilots: Vec<Pilot>,
    pub suggested_drones: Vec<Drone>,
    pub conflicts: Vec<Conflict>,
    pub maintenance_due_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_accessors() {
        let c = Conflict::DoubleBooking {
            pilot_id: "P001".to_string(),
            pilot_name: "Arjun".to_string(),
            project_ids: vec!["PRJ001".to_string(), "PRJ002".to_string()],
        };
        assert_eq!(c.kind(), ConflictKind::DoubleBooking);
        assert_eq!(c.project_ids(), vec!["PRJ001", "PRJ002"]);
        assert_eq!(c.pilot_id(), Some("P001"));
        assert_eq!(c.drone_id(), None);
        assert!(c.names_project("prj002"));
        assert!(!c.names_project("PRJ003"));
    }

    #[test]
    fn test_dangling_holder_accessors() {
        let drone = Conflict::DanglingAssignment {
            holder: EntityKind::Drone,
            holder_id: "D004".to_string(),
            project_id: "PRJ404".to_string(),
        };
        assert_eq!(drone.drone_id(), Some("D004"));
        assert_eq!(drone.pilot_id(), None);
    }

    #[test]
    fn test_conflict_serializes_with_kind_tag() {
        let c = Conflict::DroneMaintenance {
            drone_id: "D002".to_string(),
            project_id: "PRJ001".to_string(),
            reason: MaintenanceReason::InMaintenance,
            maintenance_due: None,
        };
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["kind"], "drone_maintenance");
        assert_eq!(value["reason"], "in_maintenance");
    }
}

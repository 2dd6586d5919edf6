use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::normalize_status;
use crate::error::OpsError;
use crate::utils::{contains_ignore_case, eq_ignore_case, ids_match};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DroneStatus {
    Available,
    #[serde(alias = "Deployed")]
    Assigned,
    #[serde(rename = "In Maintenance", alias = "Maintenance")]
    InMaintenance,
    Unavailable,
}

impl DroneStatus {
    pub const ALL: [DroneStatus; 4] = [
        DroneStatus::Available,
        DroneStatus::Assigned,
        DroneStatus::InMaintenance,
        DroneStatus::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DroneStatus::Available => "Available",
            DroneStatus::Assigned => "Assigned",
            DroneStatus::InMaintenance => "In Maintenance",
            DroneStatus::Unavailable => "Unavailable",
        }
    }
}

impl std::fmt::Display for DroneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DroneStatus {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_status(s).as_str() {
            "available" => Ok(DroneStatus::Available),
            "assigned" | "deployed" => Ok(DroneStatus::Assigned),
            "in maintenance" | "inmaintenance" | "maintenance" => Ok(DroneStatus::InMaintenance),
            "unavailable" => Ok(DroneStatus::Unavailable),
            _ => Err(OpsError::InvalidValue(format!(
                "drone status '{}' must be one of Available, Assigned, In Maintenance, Unavailable",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drone {
    pub drone_id: String,
    pub model: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub status: DroneStatus,
    pub location: String,
    #[serde(default)]
    pub assigned_project_id: Option<String>,
    #[serde(default)]
    pub maintenance_due: Option<NaiveDate>,
}

impl Drone {
    pub fn is_available(&self) -> bool {
        self.status == DroneStatus::Available
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        contains_ignore_case(&self.capabilities, capability)
    }

    pub fn is_assigned_to(&self, project_id: &str) -> bool {
        self.assigned_project_id
            .as_deref()
            .map(|p| ids_match(p, project_id))
            .unwrap_or(false)
    }

    /// Maintenance date strictly before `today`.
    pub fn is_maintenance_overdue(&self, today: NaiveDate) -> bool {
        self.maintenance_due.map(|due| due < today).unwrap_or(false)
    }

    /// Maintenance date on or before `today`.
    pub fn is_maintenance_due(&self, today: NaiveDate) -> bool {
        self.maintenance_due.map(|due| due <= today).unwrap_or(false)
    }
}

/// Fleet query. Every criterion that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneFilter {
    #[serde(default)]
    pub capability: Option<String>,
    #[serde(default)]
    pub status: Option<DroneStatus>,
    #[serde(default)]
    pub location: Option<String>,
}

impl DroneFilter {
    pub fn matches(&self, drone: &Drone) -> bool {
        self.capability
            .as_deref()
            .map_or(true, |c| drone.has_capability(c))
            && self.status.map_or(true, |s| drone.status == s)
            && self
                .location
                .as_deref()
                .map_or(true, |l| eq_ignore_case(&drone.location, l))
    }
}

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::normalize_status;
use crate::error::OpsError;
use crate::utils::{contains_ignore_case, eq_ignore_case};

/// Pilot availability. Only `Assigned` carries a current assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PilotStatus {
    Available,
    Assigned,
    #[serde(rename = "On Leave", alias = "OnLeave")]
    OnLeave,
    Unavailable,
}

impl PilotStatus {
    pub const ALL: [PilotStatus; 4] = [
        PilotStatus::Available,
        PilotStatus::Assigned,
        PilotStatus::OnLeave,
        PilotStatus::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PilotStatus::Available => "Available",
            PilotStatus::Assigned => "Assigned",
            PilotStatus::OnLeave => "On Leave",
            PilotStatus::Unavailable => "Unavailable",
        }
    }
}

impl std::fmt::Display for PilotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PilotStatus {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_status(s).as_str() {
            "available" => Ok(PilotStatus::Available),
            "assigned" => Ok(PilotStatus::Assigned),
            "on leave" | "onleave" | "leave" => Ok(PilotStatus::OnLeave),
            "unavailable" => Ok(PilotStatus::Unavailable),
            _ => Err(OpsError::InvalidValue(format!(
                "pilot status '{}' must be one of Available, Assigned, On Leave, Unavailable",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pilot {
    pub pilot_id: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    pub status: PilotStatus,
    #[serde(default)]
    pub current_assignment: Option<String>,
    #[serde(default)]
    pub available_from: Option<NaiveDate>,
}

impl Pilot {
    pub fn is_available(&self) -> bool {
        self.status == PilotStatus::Available
    }

    pub fn is_assigned_to(&self, project_id: &str) -> bool {
        self.current_assignment
            .as_deref()
            .map(|a| crate::utils::ids_match(a, project_id))
            .unwrap_or(false)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        contains_ignore_case(&self.skills, skill)
    }

    pub fn has_certification(&self, cert: &str) -> bool {
        contains_ignore_case(&self.certifications, cert)
    }

    /// `status == Assigned` iff a current assignment is held.
    pub fn is_consistent(&self) -> bool {
        (self.status == PilotStatus::Assigned) == self.current_assignment.is_some()
    }

    /// Drop the assignment and take the given non-assigned status.
    pub(crate) fn release(&mut self, status: PilotStatus) {
        self.current_assignment = None;
        self.status = status;
    }
}

/// Roster query. Every criterion that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotFilter {
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub certification: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<PilotStatus>,
}

impl PilotFilter {
    pub fn with_status(status: PilotStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, pilot: &Pilot) -> bool {
        self.skill.as_deref().map_or(true, |s| pilot.has_skill(s))
            && self
                .certification
                .as_deref()
                .map_or(true, |c| pilot.has_certification(c))
            && self
                .location
                .as_deref()
                .map_or(true, |l| eq_ignore_case(&pilot.location, l))
            && self.status.map_or(true, |s| pilot.status == s)
    }
}

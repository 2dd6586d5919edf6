//! Typed access to the loaded roster, fleet and missions.
//!
//! `list_*` return owned snapshots in source order; the slice accessors are
//! for the engine, which only borrows. Ids are looked up trimmed and
//! case-insensitively, first row wins.
//! Pilot mutations reach every row with the id.

use chrono::NaiveDate;

use crate::error::{EntityKind, OpsError};
use crate::models::{Drone, DroneFilter, Pilot, PilotFilter, Project};
use crate::utils::ids_match;

#[derive(Debug, Clone, Default)]
pub struct Repository {
    pilots: Vec<Pilot>,
    drones: Vec<Drone>,
    missions: Vec<Project>,
}

impl Repository {
    pub fn new(pilots: Vec<Pilot>, drones: Vec<Drone>, missions: Vec<Project>) -> Self {
        Self {
            pilots,
            drones,
            missions,
        }
    }

    // ===== Snapshots =====

    pub fn list_pilots(&self) -> Vec<Pilot> {
        self.pilots.clone()
    }

    pub fn list_drones(&self) -> Vec<Drone> {
        self.drones.clone()
    }

    pub fn list_missions(&self) -> Vec<Project> {
        self.missions.clone()
    }

    pub fn pilots(&self) -> &[Pilot] {
        &self.pilots
    }

    pub fn drones(&self) -> &[Drone] {
        &self.drones
    }

    pub fn missions(&self) -> &[Project] {
        &self.missions
    }

    // ===== Lookup =====

    pub fn get_pilot(&self, pilot_id: &str) -> Result<&Pilot, OpsError> {
        self.pilots
            .iter()
            .find(|p| ids_match(&p.pilot_id, pilot_id))
            .ok_or_else(|| OpsError::not_found(EntityKind::Pilot, pilot_id))
    }

    pub fn get_drone(&self, drone_id: &str) -> Result<&Drone, OpsError> {
        self.drones
            .iter()
            .find(|d| ids_match(&d.drone_id, drone_id))
            .ok_or_else(|| OpsError::not_found(EntityKind::Drone, drone_id))
    }

    pub fn get_project(&self, project_id: &str) -> Result<&Project, OpsError> {
        self.find_project(project_id)
            .ok_or_else(|| OpsError::not_found(EntityKind::Project, project_id))
    }

    pub fn find_project(&self, project_id: &str) -> Option<&Project> {
        self.missions
            .iter()
            .find(|m| ids_match(&m.project_id, project_id))
    }

    /// Every roster row carrying the id, in source order. Duplicate rows
    /// describe one pilot, so mutations go to all of them.
    pub(crate) fn pilots_mut(&mut self, pilot_id: &str) -> Result<Vec<&mut Pilot>, OpsError> {
        let rows: Vec<&mut Pilot> = self
            .pilots
            .iter_mut()
            .filter(|p| ids_match(&p.pilot_id, pilot_id))
            .collect();
        if rows.is_empty() {
            return Err(OpsError::not_found(EntityKind::Pilot, pilot_id));
        }
        Ok(rows)
    }

    pub(crate) fn drone_mut(&mut self, drone_id: &str) -> Result<&mut Drone, OpsError> {
        self.drones
            .iter_mut()
            .find(|d| ids_match(&d.drone_id, drone_id))
            .ok_or_else(|| OpsError::not_found(EntityKind::Drone, drone_id))
    }

    // ===== Queries =====

    pub fn filter_pilots(&self, filter: &PilotFilter) -> Vec<Pilot> {
        self.pilots
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect()
    }

    pub fn filter_drones(&self, filter: &DroneFilter) -> Vec<Drone> {
        self.drones
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect()
    }

    pub fn current_assignments(&self) -> Vec<Pilot> {
        self.pilots
            .iter()
            .filter(|p| p.current_assignment.is_some())
            .cloned()
            .collect()
    }

    /// Drones whose maintenance date is on or before `today`.
    pub fn maintenance_due(&self, today: NaiveDate) -> Vec<Drone> {
        self.drones
            .iter()
            .filter(|d| d.is_maintenance_due(today))
            .cloned()
            .collect()
    }

    // ===== Commitments =====

    /// Pilots holding the project as current assignment or listed on it.
    pub fn pilots_on_project(&self, project_id: &str) -> Vec<&Pilot> {
        let listed = self.find_project(project_id);
        self.pilots
            .iter()
            .filter(|p| {
                p.is_assigned_to(project_id) || listed.map_or(false, |m| m.lists_pilot(&p.pilot_id))
            })
            .collect()
    }

    pub fn drones_on_project(&self, project_id: &str) -> Vec<&Drone> {
        self.drones
            .iter()
            .filter(|d| d.is_assigned_to(project_id))
            .collect()
    }

    /// Active, existing projects a pilot is committed to: current
    /// assignments (across duplicate roster rows) first, then missions
    /// listing the pilot. Each project appears once.
    pub fn commitments(&self, pilot_id: &str, today: NaiveDate) -> Vec<&Project> {
        let assigned = self
            .pilots
            .iter()
            .filter(|p| ids_match(&p.pilot_id, pilot_id))
            .filter_map(|p| p.current_assignment.as_deref())
            .filter_map(|id| self.find_project(id));
        let listed = self.missions.iter().filter(|m| m.lists_pilot(pilot_id));

        let mut projects: Vec<&Project> = Vec::new();
        for project in assigned.chain(listed) {
            if !project.is_active(today) {
                continue;
            }
            if projects
                .iter()
                .any(|p| ids_match(&p.project_id, &project.project_id))
            {
                continue;
            }
            projects.push(project);
        }
        projects
    }

    /// Active, existing project a drone is committed to.
    pub fn drone_commitment(&self, drone: &Drone, today: NaiveDate) -> Option<&Project> {
        drone
            .assigned_project_id
            .as_deref()
            .and_then(|id| self.find_project(id))
            .filter(|p| p.is_active(today))
    }
}

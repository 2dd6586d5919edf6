//! The orchestrator: an owned session over the loaded tables.
//!
//! Every mutation is applied in memory first and then written through to
//! the store. A failed write leaves the mutation in place, marks the table
//! as pending and reports `OpsError::PersistenceFailed`; `sync` retries.
//! Rows are written back over the rows as loaded, so columns the records
//! do not model are preserved.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::engine;
use crate::error::{OpsError, Table};
use crate::models::{
    Conflict, Drone, DroneFilter, DroneStatus, Pilot, PilotFilter, PilotStatus, Project,
    ReassignmentBundle,
};
use crate::repository::Repository;
use crate::store::records::{
    drones_from_rows, drones_to_rows, pilots_from_rows, pilots_to_rows, projects_from_rows,
};
use crate::store::{Backend, Row, Storage, StoreError};
use crate::utils::ids_match;

#[derive(Debug, Default, Clone, Copy)]
struct PendingWrites {
    pilots: bool,
    drones: bool,
}

pub struct Session<S: Storage = Backend> {
    store: S,
    repo: Repository,
    pilot_rows: Vec<Row>,
    drone_rows: Vec<Row>,
    evaluation_date: Option<NaiveDate>,
    pending: PendingWrites,
}

impl<S: Storage> Session<S> {
    /// Read all three tables concurrently and build the session.
    pub async fn load(store: S) -> Result<Self, OpsError> {
        let (pilot_rows, drone_rows, mission_rows) = futures::try_join!(
            store.read_pilots(),
            store.read_drones(),
            store.read_missions()
        )?;

        let repo = Repository::new(
            pilots_from_rows(&pilot_rows)?,
            drones_from_rows(&drone_rows)?,
            projects_from_rows(&mission_rows)?,
        );
        info!(
            pilots = repo.pilots().len(),
            drones = repo.drones().len(),
            missions = repo.missions().len(),
            "Session loaded"
        );

        Ok(Self {
            store,
            repo,
            pilot_rows,
            drone_rows,
            evaluation_date: None,
            pending: PendingWrites::default(),
        })
    }

    /// Pin the evaluation date instead of using today's UTC date.
    pub fn with_evaluation_date(mut self, today: NaiveDate) -> Self {
        self.evaluation_date = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.evaluation_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ===== Queries =====

    pub fn list_pilots(&self) -> Vec<Pilot> {
        self.repo.list_pilots()
    }

    pub fn list_drones(&self) -> Vec<Drone> {
        self.repo.list_drones()
    }

    pub fn list_missions(&self) -> Vec<Project> {
        self.repo.list_missions()
    }

    pub fn get_pilot(&self, pilot_id: &str) -> Result<Pilot, OpsError> {
        self.repo.get_pilot(pilot_id).cloned()
    }

    pub fn get_drone(&self, drone_id: &str) -> Result<Drone, OpsError> {
        self.repo.get_drone(drone_id).cloned()
    }

    pub fn get_project(&self, project_id: &str) -> Result<Project, OpsError> {
        self.repo.get_project(project_id).cloned()
    }

    pub fn list_pilots_filtered(&self, filter: &PilotFilter) -> Vec<Pilot> {
        self.repo.filter_pilots(filter)
    }

    pub fn available_pilots(&self) -> Vec<Pilot> {
        self.repo
            .filter_pilots(&PilotFilter::with_status(PilotStatus::Available))
    }

    pub fn list_drones_filtered(&self, filter: &DroneFilter) -> Vec<Drone> {
        self.repo.filter_drones(filter)
    }

    pub fn current_assignments(&self) -> Vec<Pilot> {
        self.repo.current_assignments()
    }

    pub fn maintenance_due(&self) -> Vec<Drone> {
        self.repo.maintenance_due(self.today())
    }

    pub fn match_pilots_to_project(&self, project_id: &str) -> Result<Vec<Pilot>, OpsError> {
        engine::match_pilots_to_project(&self.repo, project_id, self.today())
    }

    pub fn match_drones_to_project(&self, project_id: &str) -> Result<Vec<Drone>, OpsError> {
        engine::match_drones_to_project(&self.repo, project_id, self.today())
    }

    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        engine::detect_conflicts(&self.repo, self.today())
    }

    pub fn suggest_urgent_reassignment(
        &self,
        project_id: &str,
        reason: Option<String>,
    ) -> Result<ReassignmentBundle, OpsError> {
        engine::suggest_urgent_reassignment(&self.repo, project_id, reason, self.today())
    }

    // ===== Pilot mutations =====

    /// Any status other than `Assigned` clears the current assignment.
    /// `Assigned` is only accepted for a pilot that already holds one.
    /// Every roster row with the id is updated.
    pub async fn update_pilot_status(
        &mut self,
        pilot_id: &str,
        status: PilotStatus,
    ) -> Result<Pilot, OpsError> {
        let mut rows = self.repo.pilots_mut(pilot_id)?;
        if status == PilotStatus::Assigned {
            let Some(held) = rows.iter().find_map(|p| p.current_assignment.clone()) else {
                return Err(OpsError::InvalidValue(format!(
                    "Pilot {} has no current assignment; assign a project instead",
                    rows[0].pilot_id
                )));
            };
            for pilot in rows.iter_mut() {
                pilot.current_assignment.get_or_insert_with(|| held.clone());
                pilot.status = PilotStatus::Assigned;
            }
        } else {
            for pilot in rows.iter_mut() {
                pilot.release(status);
            }
        }

        let updated = rows[0].clone();
        info!(pilot_id = %updated.pilot_id, status = %updated.status, "Updated pilot status");
        self.persist_pilots().await?;
        Ok(updated)
    }

    /// Rejects with `Conflict` when another active commitment of the pilot
    /// overlaps the project's dates. Re-assigning the same project is a no-op.
    pub async fn assign_pilot(&mut self, pilot_id: &str, project_id: &str) -> Result<Pilot, OpsError> {
        let today = self.today();
        let project = self.repo.get_project(project_id)?.clone();
        let pilot = self.repo.get_pilot(pilot_id)?;

        let settled = self
            .repo
            .pilots()
            .iter()
            .filter(|p| ids_match(&p.pilot_id, pilot_id))
            .all(|p| p.status == PilotStatus::Assigned && p.is_assigned_to(&project.project_id));
        if settled {
            debug!(pilot_id = %pilot.pilot_id, project_id = %project.project_id, "Already assigned");
            return Ok(pilot.clone());
        }

        let clash = self
            .repo
            .commitments(&pilot.pilot_id, today)
            .into_iter()
            .find(|c| !ids_match(&c.project_id, &project.project_id) && c.overlaps(&project));
        if let Some(clash) = clash {
            return Err(OpsError::Conflict(format!(
                "Pilot {} is already committed to {}, whose dates overlap {}",
                pilot.pilot_id, clash.project_id, project.project_id
            )));
        }

        let mut rows = self.repo.pilots_mut(pilot_id)?;
        for pilot in rows.iter_mut() {
            if let Some(previous) = pilot.current_assignment.replace(project.project_id.clone()) {
                if !ids_match(&previous, &project.project_id) {
                    debug!(pilot_id = %pilot.pilot_id, previous = %previous, "Replacing current assignment");
                }
            }
            pilot.status = PilotStatus::Assigned;
        }

        let updated = rows[0].clone();
        info!(pilot_id = %updated.pilot_id, project_id = %project.project_id, "Assigned pilot");
        self.persist_pilots().await?;
        Ok(updated)
    }

    /// Clear the assignment and make the pilot Available. Unassigning a
    /// pilot without an assignment changes nothing and writes nothing.
    pub async fn unassign_pilot(&mut self, pilot_id: &str) -> Result<Pilot, OpsError> {
        let mut rows = self.repo.pilots_mut(pilot_id)?;
        if rows
            .iter()
            .all(|p| p.current_assignment.is_none() && p.status != PilotStatus::Assigned)
        {
            debug!(pilot_id = %rows[0].pilot_id, "Nothing to unassign");
            return Ok(rows[0].clone());
        }

        for pilot in rows.iter_mut() {
            pilot.release(PilotStatus::Available);
        }
        let updated = rows[0].clone();
        info!(pilot_id = %updated.pilot_id, "Unassigned pilot");
        self.persist_pilots().await?;
        Ok(updated)
    }

    // ===== Drone mutations =====

    /// Available and Unavailable clear the assignment, In Maintenance keeps
    /// it, Assigned requires one.
    pub async fn update_drone_status(
        &mut self,
        drone_id: &str,
        status: DroneStatus,
    ) -> Result<Drone, OpsError> {
        let drone = self.repo.drone_mut(drone_id)?;
        match status {
            DroneStatus::Assigned if drone.assigned_project_id.is_none() => {
                return Err(OpsError::InvalidValue(format!(
                    "Drone {} has no assigned project; assign a project instead",
                    drone.drone_id
                )));
            }
            DroneStatus::Available | DroneStatus::Unavailable => {
                drone.assigned_project_id = None;
            }
            DroneStatus::Assigned | DroneStatus::InMaintenance => {}
        }
        drone.status = status;

        let updated = drone.clone();
        info!(drone_id = %updated.drone_id, status = %updated.status, "Updated drone status");
        self.persist_drones().await?;
        Ok(updated)
    }

    /// Commit a drone to a project. Drones in maintenance, unavailable, or
    /// committed to another overlapping project are rejected with `Conflict`.
    pub async fn assign_drone(&mut self, drone_id: &str, project_id: &str) -> Result<Drone, OpsError> {
        let today = self.today();
        let project = self.repo.get_project(project_id)?.clone();
        let drone = self.repo.get_drone(drone_id)?;

        if drone.status == DroneStatus::Assigned && drone.is_assigned_to(&project.project_id) {
            debug!(drone_id = %drone.drone_id, project_id = %project.project_id, "Already assigned");
            return Ok(drone.clone());
        }

        if matches!(drone.status, DroneStatus::InMaintenance | DroneStatus::Unavailable) {
            return Err(OpsError::Conflict(format!(
                "Drone {} is {} and cannot be assigned",
                drone.drone_id, drone.status
            )));
        }
        if let Some(current) = self.repo.drone_commitment(drone, today) {
            if !ids_match(&current.project_id, &project.project_id) && current.overlaps(&project) {
                return Err(OpsError::Conflict(format!(
                    "Drone {} is already committed to {}, whose dates overlap {}",
                    drone.drone_id, current.project_id, project.project_id
                )));
            }
        }

        let drone = self.repo.drone_mut(drone_id)?;
        drone.assigned_project_id = Some(project.project_id.clone());
        drone.status = DroneStatus::Assigned;

        let updated = drone.clone();
        info!(drone_id = %updated.drone_id, project_id = %project.project_id, "Assigned drone");
        self.persist_drones().await?;
        Ok(updated)
    }

    /// Clear a drone's assignment. An Assigned drone becomes Available; a
    /// drone in maintenance or unavailable keeps its status.
    pub async fn unassign_drone(&mut self, drone_id: &str) -> Result<Drone, OpsError> {
        let drone = self.repo.drone_mut(drone_id)?;
        if drone.assigned_project_id.is_none() && drone.status != DroneStatus::Assigned {
            debug!(drone_id = %drone.drone_id, "Nothing to unassign");
            return Ok(drone.clone());
        }

        drone.assigned_project_id = None;
        if drone.status == DroneStatus::Assigned {
            drone.status = DroneStatus::Available;
        }
        let updated = drone.clone();
        info!(drone_id = %updated.drone_id, "Unassigned drone");
        self.persist_drones().await?;
        Ok(updated)
    }

    // ===== Write-through =====

    pub fn has_pending_writes(&self) -> bool {
        self.pending.pilots || self.pending.drones
    }

    /// Retry every write-through left pending by an earlier failure.
    pub async fn sync(&mut self) -> Result<(), OpsError> {
        if self.pending.pilots {
            self.persist_pilots().await?;
        }
        if self.pending.drones {
            self.persist_drones().await?;
        }
        Ok(())
    }

    async fn persist_pilots(&mut self) -> Result<(), OpsError> {
        let rows = pilots_to_rows(self.repo.pilots(), &self.pilot_rows);
        let result = self.store.write_pilots(&rows).await;
        self.pilot_rows = rows;
        Self::record_write(Table::Pilots, &mut self.pending.pilots, result)
    }

    async fn persist_drones(&mut self) -> Result<(), OpsError> {
        let rows = drones_to_rows(self.repo.drones(), &self.drone_rows);
        let result = self.store.write_drones(&rows).await;
        self.drone_rows = rows;
        Self::record_write(Table::Drones, &mut self.pending.drones, result)
    }

    fn record_write(
        table: Table,
        pending: &mut bool,
        result: Result<(), StoreError>,
    ) -> Result<(), OpsError> {
        match result {
            Ok(()) => {
                *pending = false;
                info!(%table, "Write-through complete");
                Ok(())
            }
            Err(source) => {
                *pending = true;
                warn!(%table, error = %source, "Write-through failed, change kept in memory");
                Err(OpsError::PersistenceFailed { table, source })
            }
        }
    }
}

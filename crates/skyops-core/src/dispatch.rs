//! The closed request set and the outer error boundary.
//!
//! Callers hand over one `Request` at a time and get back either a
//! `Response` or an `ErrorResult`. Nothing escapes `handle` as a panic or a
//! raw error; display formatting stays with the caller.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{ErrorKind, OpsError};
use crate::models::{
    Conflict, Drone, DroneFilter, DroneStatus, Pilot, PilotFilter, PilotStatus, Project,
    ReassignmentBundle,
};
use crate::session::Session;
use crate::store::Storage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    ListPilots {
        #[serde(default)]
        filter: PilotFilter,
    },
    ListAvailable,
    ListDrones {
        #[serde(default)]
        filter: DroneFilter,
    },
    ListMissions,
    CurrentAssignments,
    MaintenanceDue,
    MatchProject {
        project_id: String,
    },
    MatchDrones {
        project_id: String,
    },
    DetectConflicts,
    UrgentReassignment {
        project_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    UpdatePilotStatus {
        pilot_id: String,
        status: String,
    },
    UpdateDroneStatus {
        drone_id: String,
        status: String,
    },
    Assign {
        pilot_id: String,
        project_id: String,
    },
    Unassign {
        pilot_id: String,
    },
    AssignDrone {
        drone_id: String,
        project_id: String,
    },
    UnassignDrone {
        drone_id: String,
    },
    Sync,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::ListPilots { .. } => "list_pilots",
            Request::ListAvailable => "list_available",
            Request::ListDrones { .. } => "list_drones",
            Request::ListMissions => "list_missions",
            Request::CurrentAssignments => "current_assignments",
            Request::MaintenanceDue => "maintenance_due",
            Request::MatchProject { .. } => "match_project",
            Request::MatchDrones { .. } => "match_drones",
            Request::DetectConflicts => "detect_conflicts",
            Request::UrgentReassignment { .. } => "urgent_reassignment",
            Request::UpdatePilotStatus { .. } => "update_pilot_status",
            Request::UpdateDroneStatus { .. } => "update_drone_status",
            Request::Assign { .. } => "assign",
            Request::Unassign { .. } => "unassign",
            Request::AssignDrone { .. } => "assign_drone",
            Request::UnassignDrone { .. } => "unassign_drone",
            Request::Sync => "sync",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "data", rename_all = "snake_case")]
pub enum Response {
    Pilots(Vec<Pilot>),
    Pilot(Pilot),
    Drones(Vec<Drone>),
    Drone(Drone),
    Missions(Vec<Project>),
    Conflicts(Vec<Conflict>),
    Reassignment(ReassignmentBundle),
    Synced,
}

/// Structured failure handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<OpsError> for ErrorResult {
    fn from(err: OpsError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Run one request against the session.
pub async fn handle<S: Storage>(
    session: &mut Session<S>,
    request: Request,
) -> Result<Response, ErrorResult> {
    let name = request.name();
    debug!(request = name, "Handling request");
    guarded(name, execute(session, request)).await
}

/// Convert errors and panics of a request future into `ErrorResult`.
async fn guarded<F>(name: &'static str, request: F) -> Result<Response, ErrorResult>
where
    F: Future<Output = Result<Response, OpsError>>,
{
    match AssertUnwindSafe(request).catch_unwind().await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(err)) => {
            warn!(request = name, error = %err, "Request failed");
            Err(err.into())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(request = name, panic = %message, "Request panicked");
            Err(ErrorResult {
                kind: ErrorKind::Internal,
                message: format!("Internal error while handling {}: {}", name, message),
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn execute<S: Storage>(session: &mut Session<S>, request: Request) -> Result<Response, OpsError> {
    let response = match request {
        Request::ListPilots { filter } => Response::Pilots(session.list_pilots_filtered(&filter)),
        Request::ListAvailable => Response::Pilots(session.available_pilots()),
        Request::ListDrones { filter } => Response::Drones(session.list_drones_filtered(&filter)),
        Request::ListMissions => Response::Missions(session.list_missions()),
        Request::CurrentAssignments => Response::Pilots(session.current_assignments()),
        Request::MaintenanceDue => Response::Drones(session.maintenance_due()),
        Request::MatchProject { project_id } => {
            Response::Pilots(session.match_pilots_to_project(&project_id)?)
        }
        Request::MatchDrones { project_id } => {
            Response::Drones(session.match_drones_to_project(&project_id)?)
        }
        Request::DetectConflicts => Response::Conflicts(session.detect_conflicts()),
        Request::UrgentReassignment { project_id, reason } => {
            Response::Reassignment(session.suggest_urgent_reassignment(&project_id, reason)?)
        }
        Request::UpdatePilotStatus { pilot_id, status } => {
            let status: PilotStatus = status.parse()?;
            Response::Pilot(session.update_pilot_status(&pilot_id, status).await?)
        }
        Request::UpdateDroneStatus { drone_id, status } => {
            let status: DroneStatus = status.parse()?;
            Response::Drone(session.update_drone_status(&drone_id, status).await?)
        }
        Request::Assign {
            pilot_id,
            project_id,
        } => Response::Pilot(session.assign_pilot(&pilot_id, &project_id).await?),
        Request::Unassign { pilot_id } => Response::Pilot(session.unassign_pilot(&pilot_id).await?),
        Request::AssignDrone {
            drone_id,
            project_id,
        } => Response::Drone(session.assign_drone(&drone_id, &project_id).await?),
        Request::UnassignDrone { drone_id } => {
            Response::Drone(session.unassign_drone(&drone_id).await?)
        }
        Request::Sync => {
            session.sync().await?;
            Response::Synced
        }
    };
    Ok(response)
}

//! Matching and conflict engine.
//!
//! Pure functions over a `Repository` and an explicit evaluation date.
//! Nothing here mutates state.

pub mod conflicts;
pub mod matching;

use chrono::NaiveDate;

use crate::error::OpsError;
use crate::models::ReassignmentBundle;
use crate::repository::Repository;

pub use conflicts::{conflicts_for_project, detect_conflicts};
pub use matching::{match_drones_to_project, match_pilots_to_project};

/// Replacement pilots and drones for a project together with the conflicts
/// touching it. A suggestion only; nothing is applied.
pub fn suggest_urgent_reassignment(
    repo: &Repository,
    project_id: &str,
    reason: Option<String>,
    today: NaiveDate,
) -> Result<ReassignmentBundle, OpsError> {
    let project = repo.get_project(project_id)?;

    Ok(ReassignmentBundle {
        project_id: project.project_id.clone(),
        reason: reason.filter(|r| !r.trim().is_empty()),
        suggested_pilots: match_pilots_to_project(repo, &project.project_id, today)?,
        suggested_drones: match_drones_to_project(repo, &project.project_id, today)?,
        conflicts: conflicts_for_project(repo, &project.project_id, today),
        maintenance_due_count: repo.maintenance_due(today).len(),
    })
}

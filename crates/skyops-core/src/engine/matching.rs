use chrono::NaiveDate;

use crate::error::OpsError;
use crate::models::{Drone, Pilot, Project};
use crate::repository::Repository;
use crate::utils::{cmp_ignore_case, eq_ignore_case, ids_match};

/// An empty requirement list is satisfied by anyone; otherwise at least
/// one listed item must be held.
pub(crate) fn requirement_met(required: &[String], holds: impl Fn(&str) -> bool) -> bool {
    required.is_empty() || required.iter().any(|r| holds(r.as_str()))
}

/// Available pilots based at the project location who cover its skill and
/// certification requirements and have no other overlapping commitment.
/// Sorted by pilot id.
pub fn match_pilots_to_project(
    repo: &Repository,
    project_id: &str,
    today: NaiveDate,
) -> Result<Vec<Pilot>, OpsError> {
    let project = repo.get_project(project_id)?;

    let mut matches: Vec<Pilot> = repo
        .pilots()
        .iter()
        .filter(|p| pilot_qualifies(repo, p, project, today))
        .cloned()
        .collect();
    matches.sort_by(|a, b| cmp_ignore_case(&a.pilot_id, &b.pilot_id));
    Ok(matches)
}

fn pilot_qualifies(repo: &Repository, pilot: &Pilot, project: &Project, today: NaiveDate) -> bool {
    if !pilot.is_available() || !eq_ignore_case(&pilot.location, &project.location) {
        return false;
    }
    if !requirement_met(&project.required_skills, |s| pilot.has_skill(s))
        || !requirement_met(&project.required_certs, |c| pilot.has_certification(c))
    {
        return false;
    }
    if let (Some(from), Some(start)) = (pilot.available_from, project.start_date) {
        if from > start {
            return false;
        }
    }

    !repo
        .commitments(&pilot.pilot_id, today)
        .iter()
        .any(|c| !ids_match(&c.project_id, &project.project_id) && c.overlaps(project))
}

/// Available drones at the project location carrying a needed capability
/// whose maintenance is not overdue. Sorted by drone id.
pub fn match_drones_to_project(
    repo: &Repository,
    project_id: &str,
    today: NaiveDate,
) -> Result<Vec<Drone>, OpsError> {
    let project = repo.get_project(project_id)?;
    let capabilities = project.drone_capabilities();

    let mut matches: Vec<Drone> = repo
        .drones()
        .iter()
        .filter(|d| {
            d.is_available()
                && eq_ignore_case(&d.location, &project.location)
                && requirement_met(&capabilities, |c| d.has_capability(c))
                && !d.is_maintenance_overdue(today)
        })
        .cloned()
        .collect();
    matches.sort_by(|a, b| cmp_ignore_case(&a.drone_id, &b.drone_id));
    Ok(matches)
}

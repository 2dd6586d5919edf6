//! Conflict detection over the loaded tables.
//!
//! Records come out grouped by kind (in `ConflictKind` order) and, within a
//! kind, in source order of the pilots, drones and missions involved.

use chrono::NaiveDate;

use super::matching::requirement_met;
use crate::error::EntityKind;
use crate::models::{Conflict, DroneStatus, MaintenanceReason, Pilot, Project};
use crate::repository::Repository;
use crate::utils::{eq_ignore_case, ids_match};

/// Every conflict in the tables. Empty when there are none.
pub fn detect_conflicts(repo: &Repository, today: NaiveDate) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    double_bookings(repo, today, &mut conflicts);
    skill_cert_mismatches(repo, &mut conflicts);
    drone_maintenance(repo, today, &mut conflicts);
    location_mismatches(repo, &mut conflicts);
    pilot_drone_location_mismatches(repo, &mut conflicts);
    dangling_assignments(repo, &mut conflicts);
    conflicts
}

/// Conflicts naming the project or anyone/anything committed to it.
pub fn conflicts_for_project(repo: &Repository, project_id: &str, today: NaiveDate) -> Vec<Conflict> {
    let crew = repo.pilots_on_project(project_id);
    let drones = repo.drones_on_project(project_id);
    detect_conflicts(repo, today)
        .into_iter()
        .filter(|c| c.concerns(project_id, &crew, &drones))
        .collect()
}

/// Pilots listed once per id, first roster row wins.
fn distinct_pilots(repo: &Repository) -> impl Iterator<Item = &Pilot> {
    let pilots = repo.pilots();
    pilots.iter().enumerate().filter_map(move |(idx, p)| {
        let seen = pilots[..idx]
            .iter()
            .any(|earlier| ids_match(&earlier.pilot_id, &p.pilot_id));
        (!seen).then_some(p)
    })
}

/// A pilot's assigned project, if it exists.
fn assigned_project<'a>(repo: &'a Repository, pilot: &Pilot) -> Option<&'a Project> {
    pilot
        .current_assignment
        .as_deref()
        .and_then(|id| repo.find_project(id))
}

fn double_bookings(repo: &Repository, today: NaiveDate, out: &mut Vec<Conflict>) {
    for pilot in distinct_pilots(repo) {
        let commitments = repo.commitments(&pilot.pilot_id, today);
        let colliding: Vec<String> = commitments
            .iter()
            .enumerate()
            .filter(|(i, a)| {
                commitments
                    .iter()
                    .enumerate()
                    .any(|(j, b)| *i != j && a.overlaps(b))
            })
            .map(|(_, p)| p.project_id.clone())
            .collect();

        if colliding.len() >= 2 {
            out.push(Conflict::DoubleBooking {
                pilot_id: pilot.pilot_id.clone(),
                pilot_name: pilot.name.clone(),
                project_ids: colliding,
            });
        }
    }
}

fn skill_cert_mismatches(repo: &Repository, out: &mut Vec<Conflict>) {
    for pilot in repo.pilots() {
        let Some(project) = assigned_project(repo, pilot) else {
            continue;
        };

        let skills_ok = requirement_met(&project.required_skills, |s| pilot.has_skill(s));
        let certs_ok = requirement_met(&project.required_certs, |c| pilot.has_certification(c));
        if skills_ok && certs_ok {
            continue;
        }

        out.push(Conflict::SkillCertMismatch {
            pilot_id: pilot.pilot_id.clone(),
            pilot_name: pilot.name.clone(),
            project_id: project.project_id.clone(),
            missing_skills: if skills_ok {
                Vec::new()
            } else {
                missing(&project.required_skills, |s| pilot.has_skill(s))
            },
            missing_certs: if certs_ok {
                Vec::new()
            } else {
                missing(&project.required_certs, |c| pilot.has_certification(c))
            },
        });
    }
}

fn missing(required: &[String], holds: impl Fn(&str) -> bool) -> Vec<String> {
    required
        .iter()
        .filter(|r| !holds(r.as_str()))
        .cloned()
        .collect()
}

fn drone_maintenance(repo: &Repository, today: NaiveDate, out: &mut Vec<Conflict>) {
    for drone in repo.drones() {
        let Some(project) = repo.drone_commitment(drone, today) else {
            continue;
        };

        let reason = if drone.status == DroneStatus::InMaintenance {
            MaintenanceReason::InMaintenance
        } else if drone.is_maintenance_overdue(today) {
            MaintenanceReason::Overdue
        } else {
            continue;
        };

        out.push(Conflict::DroneMaintenance {
            drone_id: drone.drone_id.clone(),
            project_id: project.project_id.clone(),
            reason,
            maintenance_due: drone.maintenance_due,
        });
    }
}

fn location_mismatches(repo: &Repository, out: &mut Vec<Conflict>) {
    for pilot in repo.pilots() {
        let Some(project) = assigned_project(repo, pilot) else {
            continue;
        };
        if eq_ignore_case(&pilot.location, &project.location) {
            continue;
        }
        out.push(Conflict::LocationMismatch {
            pilot_id: pilot.pilot_id.clone(),
            pilot_name: pilot.name.clone(),
            pilot_location: pilot.location.clone(),
            project_id: project.project_id.clone(),
            project_location: project.location.clone(),
        });
    }
}

fn pilot_drone_location_mismatches(repo: &Repository, out: &mut Vec<Conflict>) {
    for project in repo.missions() {
        let drones = repo.drones_on_project(&project.project_id);
        if drones.is_empty() {
            continue;
        }
        for pilot in repo
            .pilots()
            .iter()
            .filter(|p| p.is_assigned_to(&project.project_id))
        {
            for drone in drones
                .iter()
                .filter(|d| !eq_ignore_case(&d.location, &pilot.location))
            {
                out.push(Conflict::PilotDroneLocationMismatch {
                    pilot_id: pilot.pilot_id.clone(),
                    pilot_location: pilot.location.clone(),
                    drone_id: drone.drone_id.clone(),
                    drone_location: drone.location.clone(),
                    project_id: project.project_id.clone(),
                });
            }
        }
    }
}

fn dangling_assignments(repo: &Repository, out: &mut Vec<Conflict>) {
    let pilots = repo.pilots().iter().filter_map(|p| {
        p.current_assignment
            .as_deref()
            .map(|a| (EntityKind::Pilot, &p.pilot_id, a))
    });
    let drones = repo.drones().iter().filter_map(|d| {
        d.assigned_project_id
            .as_deref()
            .map(|a| (EntityKind::Drone, &d.drone_id, a))
    });

    for (holder, holder_id, project_id) in pilots.chain(drones) {
        if repo.find_project(project_id).is_none() {
            out.push(Conflict::DanglingAssignment {
                holder,
                holder_id: holder_id.clone(),
                project_id: project_id.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::models::{ConflictKind, Drone};

    fn kinds(conflicts: &[Conflict]) -> Vec<ConflictKind> {
        conflicts.iter().map(Conflict::kind).collect()
    }

    fn clean_repo() -> Repository {
        let mut repo = sample_repo();
        for p in repo.pilots_mut("P003").unwrap() {
            p.release(crate::models::PilotStatus::Available);
        }
        repo
    }

    #[test]
    fn test_clean_tables_have_no_conflicts() {
        assert!(detect_conflicts(&clean_repo(), today()).is_empty());
    }

    #[test]
    fn test_sample_reports_skill_and_location_mismatch() {
        let conflicts = detect_conflicts(&sample_repo(), today());
        assert_eq!(
            kinds(&conflicts),
            vec![ConflictKind::SkillCertMismatch, ConflictKind::LocationMismatch]
        );
        match &conflicts[0] {
            Conflict::SkillCertMismatch {
                pilot_id,
                missing_skills,
                missing_certs,
                ..
            } => {
                assert_eq!(pilot_id, "P003");
                assert_eq!(missing_skills, &vec!["Inspection".to_string()]);
                assert!(missing_certs.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_injected_double_booking_is_reported() {
        let mut missions = clean_repo().list_missions();
        missions[0].assigned_pilots = vec!["P001".to_string()];
        missions[1].assigned_pilots = vec!["P001".to_string()];
        let repo = Repository::new(clean_repo().list_pilots(), vec![], missions);

        let conflicts = detect_conflicts(&repo, today());
        assert_eq!(
            conflicts,
            vec![Conflict::DoubleBooking {
                pilot_id: "P001".to_string(),
                pilot_name: "Pilot P001".to_string(),
                project_ids: vec!["PRJ001".to_string(), "PRJ002".to_string()],
            }]
        );
    }

    #[test]
    fn test_duplicate_roster_rows_double_booking() {
        let p = pilot("P001", "Bangalore", &["Mapping", "Inspection"], &["DGCA"]);
        let mut missions = clean_repo().list_missions();
        missions[1].location = "Bangalore".to_string();
        let repo = Repository::new(
            vec![assigned(p.clone(), "PRJ001"), assigned(p, "PRJ002")],
            vec![],
            missions,
        );

        let conflicts = detect_conflicts(&repo, today());
        assert_eq!(kinds(&conflicts), vec![ConflictKind::DoubleBooking]);
    }

    #[test]
    fn test_non_overlapping_commitments_are_fine() {
        let mut missions = clean_repo().list_missions();
        missions[1].start_date = Some(date(2026, 2, 21));
        missions[0].assigned_pilots = vec!["P001".to_string()];
        missions[1].assigned_pilots = vec!["P001".to_string()];
        let repo = Repository::new(clean_repo().list_pilots(), vec![], missions);
        assert!(detect_conflicts(&repo, today()).is_empty());
    }

    #[test]
    fn test_ended_mission_does_not_double_book() {
        let mut missions = clean_repo().list_missions();
        missions[0].start_date = Some(date(2026, 1, 1));
        missions[0].end_date = Some(date(2026, 1, 31));
        missions[1].start_date = Some(date(2026, 1, 15));
        missions[0].assigned_pilots = vec!["P001".to_string()];
        missions[1].assigned_pilots = vec!["P001".to_string()];
        let repo = Repository::new(clean_repo().list_pilots(), vec![], missions);
        assert!(detect_conflicts(&repo, today()).is_empty());
    }

    fn committed(mut drone: Drone, project_id: &str, status: DroneStatus) -> Drone {
        drone.status = status;
        drone.assigned_project_id = Some(project_id.to_string());
        drone
    }

    #[test]
    fn test_drone_in_maintenance_on_active_mission() {
        let mut overdue = committed(
            drone("D002", "Mumbai", &["RGB"]),
            "PRJ002",
            DroneStatus::Assigned,
        );
        overdue.maintenance_due = Some(date(2026, 1, 15));
        let repo = Repository::new(
            vec![],
            vec![
                committed(drone("D001", "Bangalore", &["RGB"]), "PRJ001", DroneStatus::InMaintenance),
                overdue,
                committed(drone("D003", "Bangalore", &["RGB"]), "PRJ001", DroneStatus::Assigned),
            ],
            clean_repo().list_missions(),
        );

        let conflicts = detect_conflicts(&repo, today());
        assert_eq!(conflicts.len(), 2);
        assert!(matches!(
            &conflicts[0],
            Conflict::DroneMaintenance { drone_id, reason: MaintenanceReason::InMaintenance, .. }
                if drone_id == "D001"
        ));
        assert!(matches!(
            &conflicts[1],
            Conflict::DroneMaintenance { drone_id, reason: MaintenanceReason::Overdue, .. }
                if drone_id == "D002"
        ));
    }

    #[test]
    fn test_pilot_drone_location_mismatch() {
        let repo = Repository::new(
            vec![assigned(pilot("P001", "Bangalore", &["Mapping"], &["DGCA"]), "PRJ001")],
            vec![committed(drone("D009", "Pune", &["RGB"]), "PRJ001", DroneStatus::Assigned)],
            clean_repo().list_missions(),
        );
        let conflicts = detect_conflicts(&repo, today());
        assert_eq!(kinds(&conflicts), vec![ConflictKind::PilotDroneLocationMismatch]);
        assert_eq!(conflicts[0].drone_id(), Some("D009"));
    }

    #[test]
    fn test_dangling_assignment_is_reported_not_fatal() {
        let repo = Repository::new(
            vec![assigned(pilot("P001", "Bangalore", &[], &[]), "PRJ404")],
            vec![committed(drone("D001", "Bangalore", &[]), "PRJ405", DroneStatus::Assigned)],
            vec![],
        );
        let conflicts = detect_conflicts(&repo, today());
        assert_eq!(
            conflicts,
            vec![
                Conflict::DanglingAssignment {
                    holder: EntityKind::Pilot,
                    holder_id: "P001".to_string(),
                    project_id: "PRJ404".to_string(),
                },
                Conflict::DanglingAssignment {
                    holder: EntityKind::Drone,
                    holder_id: "D001".to_string(),
                    project_id: "PRJ405".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_conflicts_for_project_includes_crew_conflicts() {
        let mut missions = clean_repo().list_missions();
        missions[0].assigned_pilots = vec!["P001".to_string()];
        missions[1].assigned_pilots = vec!["P001".to_string()];
        let mut pilots = sample_repo().list_pilots();
        pilots.push(assigned(pilot("P004", "Delhi", &[], &[]), "PRJ404"));
        let repo = Repository::new(pilots, vec![], missions);

        let for_prj001 = conflicts_for_project(&repo, "PRJ001", today());
        assert_eq!(kinds(&for_prj001), vec![ConflictKind::DoubleBooking]);

        let for_prj002 = conflicts_for_project(&repo, "PRJ002", today());
        assert_eq!(
            kinds(&for_prj002),
            vec![
                ConflictKind::DoubleBooking,
                ConflictKind::SkillCertMismatch,
                ConflictKind::LocationMismatch
            ]
        );
    }
}

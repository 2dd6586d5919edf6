//! Record builders shared by the unit tests.

use chrono::NaiveDate;

use crate::models::{Drone, DroneStatus, Pilot, PilotStatus, Project};
use crate::repository::Repository;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Evaluation date used throughout the tests.
pub fn today() -> NaiveDate {
    date(2026, 2, 1)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn pilot(id: &str, location: &str, skills: &[&str], certs: &[&str]) -> Pilot {
    Pilot {
        pilot_id: id.to_string(),
        name: format!("Pilot {}", id),
        location: location.to_string(),
        skills: strings(skills),
        certifications: strings(certs),
        status: PilotStatus::Available,
        current_assignment: None,
        available_from: None,
    }
}

pub fn assigned(mut pilot: Pilot, project_id: &str) -> Pilot {
    pilot.status = PilotStatus::Assigned;
    pilot.current_assignment = Some(project_id.to_string());
    pilot
}

pub fn drone(id: &str, location: &str, capabilities: &[&str]) -> Drone {
    Drone {
        drone_id: id.to_string(),
        model: "DJI M300".to_string(),
        capabilities: strings(capabilities),
        status: DroneStatus::Available,
        location: location.to_string(),
        assigned_project_id: None,
        maintenance_due: None,
    }
}

pub fn project(
    id: &str,
    location: &str,
    skills: &[&str],
    certs: &[&str],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Project {
    Project {
        project_id: id.to_string(),
        client: None,
        location: location.to_string(),
        required_skills: strings(skills),
        required_certs: strings(certs),
        required_capabilities: Vec::new(),
        start_date: start,
        end_date: end,
        priority: None,
        assigned_pilots: Vec::new(),
    }
}

/// Bangalore mapping pilot P001 and mission PRJ001, plus a Mumbai
/// inspection mission PRJ002 that overlaps it.
pub fn sample_repo() -> Repository {
    Repository::new(
        vec![
            pilot("P001", "Bangalore", &["Mapping", "Survey"], &["DGCA", "Night Ops"]),
            pilot("P002", "Mumbai", &["Inspection"], &["DGCA"]),
            assigned(pilot("P003", "Bangalore", &["Thermal"], &["DGCA"]), "PRJ002"),
        ],
        vec![
            drone("D001", "Bangalore", &["LiDAR", "RGB"]),
            drone("D002", "Mumbai", &["RGB", "Thermal"]),
        ],
        vec![
            project(
                "PRJ001",
                "Bangalore",
                &["Mapping"],
                &["DGCA"],
                Some(date(2026, 2, 10)),
                Some(date(2026, 2, 20)),
            ),
            project(
                "PRJ002",
                "Mumbai",
                &["Inspection"],
                &["DGCA"],
                Some(date(2026, 2, 15)),
                Some(date(2026, 2, 25)),
            ),
        ],
    )
}

//! Conversions between typed records and storage rows.

use chrono::NaiveDate;
use tracing::warn;

use super::row::{format_date, join_list, parse_date, write_cell, Row};
use crate::error::{OpsError, Table};
use crate::models::{Drone, DroneStatus, Pilot, PilotStatus, Project};

pub const PILOT_COLUMNS: &[&str] = &[
    "pilot_id",
    "name",
    "skills",
    "certifications",
    "location",
    "status",
    "current_assignment",
    "available_from",
];

pub const DRONE_COLUMNS: &[&str] = &[
    "drone_id",
    "model",
    "capabilities",
    "status",
    "location",
    "current_assignment",
    "maintenance_due",
];

const DRONE_ASSIGNMENT_KEYS: &[&str] = &["current_assignment", "assigned_project_id"];

const PILOT_CERT_KEYS: &[&str] = &["certifications", "certs"];

/// Alternative headers a written cell is copied to when the loaded row has them.
const PILOT_ALIASES: &[&[&str]] = &[PILOT_CERT_KEYS];
const DRONE_ALIASES: &[&[&str]] = &[DRONE_ASSIGNMENT_KEYS];

fn required<'a>(row: &'a Row, key: &str, table: Table, index: usize) -> Result<&'a str, OpsError> {
    row.value(key).ok_or_else(|| OpsError::MalformedRow {
        table,
        row: index + 1,
        reason: format!("missing {}", key),
    })
}

fn date_cell(row: &Row, key: &str, table: Table, index: usize) -> Option<NaiveDate> {
    let raw = row.value(key)?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        warn!(%table, row = index + 1, column = key, value = raw, "Unrecognised date, treating as empty");
    }
    parsed
}

// ===== Pilots =====

pub fn pilot_from_row(row: &Row, index: usize) -> Result<Pilot, OpsError> {
    let table = Table::Pilots;
    let pilot_id = required(row, "pilot_id", table, index)?.to_string();
    let current_assignment = row.value("current_assignment").map(str::to_string);

    let status = match row.value("status") {
        Some(raw) => raw.parse::<PilotStatus>().map_err(|e| OpsError::MalformedRow {
            table,
            row: index + 1,
            reason: e.to_string(),
        })?,
        None if current_assignment.is_some() => PilotStatus::Assigned,
        None => PilotStatus::Available,
    };

    let pilot = Pilot {
        name: row.value("name").unwrap_or_default().to_string(),
        location: row.value("location").unwrap_or_default().to_string(),
        skills: row.list(&["skills"]),
        certifications: row.list(PILOT_CERT_KEYS),
        status,
        current_assignment,
        available_from: date_cell(row, "available_from", table, index),
        pilot_id,
    };

    if !pilot.is_consistent() {
        warn!(
            pilot_id = %pilot.pilot_id,
            status = %pilot.status,
            assignment = ?pilot.current_assignment,
            "Pilot status and assignment disagree in source data"
        );
    }
    Ok(pilot)
}

pub fn pilot_to_row(pilot: &Pilot) -> Row {
    Row::new()
        .with("pilot_id", pilot.pilot_id.as_str())
        .with("name", write_cell(Some(pilot.name.as_str())))
        .with("skills", join_list(&pilot.skills))
        .with("certifications", join_list(&pilot.certifications))
        .with("location", write_cell(Some(pilot.location.as_str())))
        .with("status", pilot.status.as_str())
        .with("current_assignment", write_cell(pilot.current_assignment.as_deref()))
        .with("available_from", format_date(pilot.available_from))
}

// ===== Drones =====

pub fn drone_from_row(row: &Row, index: usize) -> Result<Drone, OpsError> {
    let table = Table::Drones;
    let drone_id = required(row, "drone_id", table, index)?.to_string();
    let assigned_project_id = row.value_any(DRONE_ASSIGNMENT_KEYS).map(str::to_string);

    let status = match row.value("status") {
        Some(raw) => raw.parse::<DroneStatus>().map_err(|e| OpsError::MalformedRow {
            table,
            row: index + 1,
            reason: e.to_string(),
        })?,
        None if assigned_project_id.is_some() => DroneStatus::Assigned,
        None => DroneStatus::Available,
    };

    Ok(Drone {
        model: row.value("model").unwrap_or_default().to_string(),
        capabilities: row.list(&["capabilities"]),
        status,
        location: row.value("location").unwrap_or_default().to_string(),
        assigned_project_id,
        maintenance_due: date_cell(row, "maintenance_due", table, index),
        drone_id,
    })
}

pub fn drone_to_row(drone: &Drone) -> Row {
    Row::new()
        .with("drone_id", drone.drone_id.as_str())
        .with("model", write_cell(Some(drone.model.as_str())))
        .with("capabilities", join_list(&drone.capabilities))
        .with("status", drone.status.as_str())
        .with("location", write_cell(Some(drone.location.as_str())))
        .with("current_assignment", write_cell(drone.assigned_project_id.as_deref()))
        .with("maintenance_due", format_date(drone.maintenance_due))
}

// ===== Missions =====

pub fn project_from_row(row: &Row, index: usize) -> Result<Project, OpsError> {
    let table = Table::Missions;
    Ok(Project {
        project_id: required(row, "project_id", table, index)?.to_string(),
        client: row.value("client").map(str::to_string),
        location: row.value("location").unwrap_or_default().to_string(),
        required_skills: row.list(&["required_skills", "required_skill"]),
        required_certs: row.list(&["required_certs", "required_certifications"]),
        required_capabilities: row.list(&["required_capabilities", "required_capability"]),
        start_date: date_cell(row, "start_date", table, index),
        end_date: date_cell(row, "end_date", table, index),
        priority: row.value("priority").map(str::to_string),
        assigned_pilots: row.list(&["assigned_pilots", "assigned_pilot"]),
    })
}

pub fn project_to_row(project: &Project) -> Row {
    Row::new()
        .with("project_id", project.project_id.as_str())
        .with("client", write_cell(project.client.as_deref()))
        .with("location", write_cell(Some(project.location.as_str())))
        .with("required_skills", join_list(&project.required_skills))
        .with("required_certs", join_list(&project.required_certs))
        .with("required_capabilities", join_list(&project.required_capabilities))
        .with("start_date", format_date(project.start_date))
        .with("end_date", format_date(project.end_date))
        .with("priority", write_cell(project.priority.as_deref()))
        .with("assigned_pilots", join_list(&project.assigned_pilots))
}

// ===== Tables =====

pub fn pilots_from_rows(rows: &[Row]) -> Result<Vec<Pilot>, OpsError> {
    rows.iter().enumerate().map(|(i, r)| pilot_from_row(r, i)).collect()
}

pub fn drones_from_rows(rows: &[Row]) -> Result<Vec<Drone>, OpsError> {
    rows.iter().enumerate().map(|(i, r)| drone_from_row(r, i)).collect()
}

pub fn projects_from_rows(rows: &[Row]) -> Result<Vec<Project>, OpsError> {
    rows.iter().enumerate().map(|(i, r)| project_from_row(r, i)).collect()
}

/// Lay freshly written cells over the row as it was loaded, so columns the
/// records do not model survive a write untouched.
fn overlay(loaded: Option<&Row>, fresh: Row, aliases: &[&[&str]]) -> Row {
    let mut row = loaded.cloned().unwrap_or_default();
    for (key, value) in fresh.cells() {
        if let Some(group) = aliases.iter().find(|group| group.first() == Some(&key)) {
            let present: Vec<&str> = group[1..].iter().copied().filter(|a| row.has(a)).collect();
            for alias in present {
                row.insert(alias, value);
            }
        }
        row.insert(key, value);
    }
    row
}

/// `loaded` holds the rows as read, index-aligned with `pilots`.
pub fn pilots_to_rows(pilots: &[Pilot], loaded: &[Row]) -> Vec<Row> {
    pilots
        .iter()
        .enumerate()
        .map(|(i, pilot)| overlay(loaded.get(i), pilot_to_row(pilot), PILOT_ALIASES))
        .collect()
}

pub fn drones_to_rows(drones: &[Drone], loaded: &[Row]) -> Vec<Row> {
    drones
        .iter()
        .enumerate()
        .map(|(i, drone)| overlay(loaded.get(i), drone_to_row(drone), DRONE_ALIASES))
        .collect()
}

pub fn projects_to_rows(projects: &[Project]) -> Vec<Row> {
    projects.iter().map(project_to_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::row::EMPTY_MARKER;

    fn pilot_row() -> Row {
        Row::from_pairs([
            ("pilot_id", "P001"),
            ("name", "Arjun"),
            ("skills", "Mapping, Survey"),
            ("certifications", "DGCA; Night Ops"),
            ("location", "Bangalore"),
            ("status", "Available"),
            ("current_assignment", "–"),
        ])
    }

    #[test]
    fn test_pilot_from_row() {
        let pilot = pilot_from_row(&pilot_row(), 0).unwrap();
        assert_eq!(pilot.pilot_id, "P001");
        assert_eq!(pilot.skills, vec!["Mapping", "Survey"]);
        assert_eq!(pilot.certifications, vec!["DGCA", "Night Ops"]);
        assert_eq!(pilot.status, PilotStatus::Available);
        assert_eq!(pilot.current_assignment, None);
        assert_eq!(pilot.available_from, None);
    }

    #[test]
    fn test_pilot_row_round_trip_uses_marker() {
        let pilot = pilot_from_row(&pilot_row(), 0).unwrap();
        let row = pilot_to_row(&pilot);
        assert_eq!(row.raw("current_assignment"), Some(EMPTY_MARKER));
        assert_eq!(row.raw("available_from"), Some(EMPTY_MARKER));
        assert_eq!(pilot_from_row(&row, 0).unwrap(), pilot);
    }

    #[test]
    fn test_pilot_missing_id_is_malformed() {
        let row = pilot_row().with("pilot_id", " ");
        let err = pilot_from_row(&row, 4).unwrap_err();
        match err {
            OpsError::MalformedRow { table, row, reason } => {
                assert_eq!(table, Table::Pilots);
                assert_eq!(row, 5);
                assert!(reason.contains("pilot_id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_pilot_bad_status_is_malformed() {
        let row = pilot_row().with("status", "Retired");
        assert!(matches!(
            pilot_from_row(&row, 0),
            Err(OpsError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_pilot_status_defaults_from_assignment() {
        let row = pilot_row().with("status", "").with("current_assignment", "PRJ001");
        let pilot = pilot_from_row(&row, 0).unwrap();
        assert_eq!(pilot.status, PilotStatus::Assigned);
    }

    #[test]
    fn test_drone_from_row_accepts_legacy_columns() {
        let row = Row::from_pairs([
            ("drone_id", "D002"),
            ("model", "Mavic 3T"),
            ("capabilities", "Thermal"),
            ("status", "Maintenance"),
            ("location", "Mumbai"),
            ("assigned_project_id", "PRJ002"),
            ("maintenance_due", "01/03/2026"),
        ]);
        let drone = drone_from_row(&row, 0).unwrap();
        assert_eq!(drone.status, DroneStatus::InMaintenance);
        assert_eq!(drone.assigned_project_id.as_deref(), Some("PRJ002"));
        assert_eq!(drone.maintenance_due, NaiveDate::from_ymd_opt(2026, 3, 1));

        let written = drone_to_row(&drone);
        assert_eq!(written.raw("status"), Some("In Maintenance"));
        assert_eq!(written.raw("current_assignment"), Some("PRJ002"));
        assert_eq!(written.raw("maintenance_due"), Some("2026-03-01"));
    }

    #[test]
    fn test_write_keeps_unmodelled_columns() {
        let loaded = pilot_row().with("phone", "+91-555").with("notes", "");
        let mut pilot = pilot_from_row(&loaded, 0).unwrap();
        pilot.release(PilotStatus::OnLeave);

        let rows = pilots_to_rows(&[pilot], std::slice::from_ref(&loaded));
        assert_eq!(rows[0].raw("phone"), Some("+91-555"));
        assert_eq!(rows[0].raw("notes"), Some(""));
        assert_eq!(rows[0].value("status"), Some("On Leave"));
    }

    #[test]
    fn test_write_updates_legacy_assignment_column() {
        let loaded = Row::from_pairs([
            ("drone_id", "D002"),
            ("status", "Assigned"),
            ("assigned_project_id", "PRJ002"),
        ]);
        let mut drone = drone_from_row(&loaded, 0).unwrap();
        drone.assigned_project_id = None;
        drone.status = DroneStatus::Available;

        let rows = drones_to_rows(&[drone], std::slice::from_ref(&loaded));
        assert_eq!(rows[0].value("assigned_project_id"), None);
        assert_eq!(rows[0].value("current_assignment"), None);
        assert_eq!(drone_from_row(&rows[0], 0).unwrap().assigned_project_id, None);
    }

    #[test]
    fn test_project_from_row() {
        let row = Row::from_pairs([
            ("project_id", "PRJ001"),
            ("client", "Client A"),
            ("location", "Bangalore"),
            ("required_skills", "Mapping"),
            ("required_certs", "DGCA"),
            ("start_date", "2026-02-06"),
            ("end_date", "–"),
            ("assigned_pilot", "P002"),
        ]);
        let project = project_from_row(&row, 0).unwrap();
        assert_eq!(project.client.as_deref(), Some("Client A"));
        assert_eq!(project.required_skills, vec!["Mapping"]);
        assert!(project.required_capabilities.is_empty());
        assert_eq!(project.start_date, NaiveDate::from_ymd_opt(2026, 2, 6));
        assert_eq!(project.end_date, None);
        assert_eq!(project.assigned_pilots, vec!["P002"]);
    }

    #[test]
    fn test_unparseable_date_is_absent() {
        let row = Row::from_pairs([("project_id", "PRJ009"), ("start_date", "soon")]);
        let project = project_from_row(&row, 0).unwrap();
        assert_eq!(project.start_date, None);
    }
}

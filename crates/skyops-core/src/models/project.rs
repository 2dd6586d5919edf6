use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::ids_match;

/// A mission schedule. An absent end date is open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Inclusive overlap. Ranges without a known start never overlap
    /// anything, since there is nothing to collide with.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        let (Some(a_start), Some(b_start)) = (self.start, other.start) else {
            return false;
        };
        let a_end = self.end.unwrap_or(NaiveDate::MAX);
        let b_end = other.end.unwrap_or(NaiveDate::MAX);
        a_start <= b_end && b_start <= a_end
    }

    pub fn has_ended(&self, today: NaiveDate) -> bool {
        self.end.map(|end| end < today).unwrap_or(false)
    }
}

/// Skill to drone capability table used when a mission does not list
/// its capabilities explicitly.
const SKILL_CAPABILITIES: &[(&str, &[&str])] = &[
    ("mapping", &["RGB", "LiDAR"]),
    ("inspection", &["RGB"]),
    ("survey", &["RGB"]),
    ("thermal", &["Thermal"]),
];

/// A mission. Read-only from the core's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    #[serde(default)]
    pub client: Option<String>,
    pub location: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub required_certs: Vec<String>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Planned staffing listed on the mission sheet.
    #[serde(default)]
    pub assigned_pilots: Vec<String>,
}

impl Project {
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn is_active(&self, today: NaiveDate) -> bool {
        !self.date_range().has_ended(today)
    }

    pub fn overlaps(&self, other: &Project) -> bool {
        self.date_range().overlaps(&other.date_range())
    }

    pub fn lists_pilot(&self, pilot_id: &str) -> bool {
        self.assigned_pilots.iter().any(|p| ids_match(p, pilot_id))
    }

    /// Capabilities a drone needs for this mission: the explicit list when
    /// present, otherwise derived from the required skills.
    pub fn drone_capabilities(&self) -> Vec<String> {
        if !self.required_capabilities.is_empty() {
            return self.required_capabilities.clone();
        }

        let mut caps: Vec<String> = Vec::new();
        for skill in &self.required_skills {
            let key = skill.trim().to_lowercase();
            let mapped: Vec<String> = SKILL_CAPABILITIES
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, caps)| caps.iter().map(|c| c.to_string()).collect())
                .unwrap_or_else(|| vec![skill.trim().to_string()]);
            for cap in mapped {
                if !crate::utils::contains_ignore_case(&caps, &cap) {
                    caps.push(cap);
                }
            }
        }
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn project(skills: &[&str], caps: &[&str]) -> Project {
        Project {
            project_id: "PRJ001".to_string(),
            client: None,
            location: "Bangalore".to_string(),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            required_certs: vec![],
            required_capabilities: caps.iter().map(|s| s.to_string()).collect(),
            start_date: date(2026, 2, 1),
            end_date: date(2026, 2, 10),
            priority: None,
            assigned_pilots: vec!["P002".to_string()],
        }
    }

    #[test]
    fn test_overlap_inclusive_bounds() {
        let a = DateRange::new(date(2026, 1, 1), date(2026, 1, 10));
        let b = DateRange::new(date(2026, 1, 10), date(2026, 1, 20));
        let c = DateRange::new(date(2026, 1, 11), date(2026, 1, 20));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_overlap_open_ended() {
        let open = DateRange::new(date(2026, 1, 1), None);
        let later = DateRange::new(date(2027, 6, 1), date(2027, 6, 2));
        let earlier = DateRange::new(date(2025, 1, 1), date(2025, 12, 31));
        assert!(open.overlaps(&later));
        assert!(!open.overlaps(&earlier));
    }

    #[test]
    fn test_overlap_requires_known_starts() {
        let unknown = DateRange::new(None, date(2026, 1, 10));
        let known = DateRange::new(date(2026, 1, 1), date(2026, 1, 10));
        assert!(!unknown.overlaps(&known));
        assert!(!known.overlaps(&unknown));
    }

    #[test]
    fn test_has_ended() {
        let range = DateRange::new(date(2026, 1, 1), date(2026, 1, 10));
        assert!(!range.has_ended(date(2026, 1, 10).unwrap()));
        assert!(range.has_ended(date(2026, 1, 11).unwrap()));
        assert!(!DateRange::new(date(2026, 1, 1), None).has_ended(date(2099, 1, 1).unwrap()));
    }

    #[test]
    fn test_drone_capabilities_explicit() {
        let p = project(&["Mapping"], &["Multispectral"]);
        assert_eq!(p.drone_capabilities(), vec!["Multispectral".to_string()]);
    }

    #[test]
    fn test_drone_capabilities_derived_from_skills() {
        let p = project(&["Mapping", "Inspection", "Crop Spraying"], &[]);
        assert_eq!(
            p.drone_capabilities(),
            vec!["RGB".to_string(), "LiDAR".to_string(), "Crop Spraying".to_string()]
        );
    }

    #[test]
    fn test_lists_pilot() {
        let p = project(&[], &[]);
        assert!(p.lists_pilot("p002"));
        assert!(!p.lists_pilot("P001"));
    }
}

//! Row mappings exchanged with the storage collaborators.
//!
//! Both backends speak in ordered (header, cell) rows. Empty cells are
//! normalised here and nowhere else: the core only ever sees `Option`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical marker written for absent values.
pub const EMPTY_MARKER: &str = "–";

/// Cell spellings that mean "no value" on read.
const EMPTY_SPELLINGS: &[&str] = &["", "-", "–", "—", "nan", "None"];

/// Accepted date layouts, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Layout used when writing dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One spreadsheet row as ordered (header, cell) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (key, value) in pairs {
            row.insert(key, value);
        }
        row
    }

    /// Set a cell, replacing an existing one with the same header.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.cells[idx].1 = value,
            None => self.cells.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    fn position(&self, key: &str) -> Option<usize> {
        let key = key.trim();
        self.cells
            .iter()
            .position(|(k, _)| k.trim().eq_ignore_ascii_case(key))
    }

    /// Raw cell text.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.position(key).map(|idx| self.cells[idx].1.as_str())
    }

    /// Trimmed cell text, `None` for any empty spelling.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.raw(key).and_then(normalize_cell)
    }

    /// First non-empty value among alternative headers.
    pub fn value_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.value(k))
    }

    pub fn list(&self, keys: &[&str]) -> Vec<String> {
        self.value_any(keys).map(split_list).unwrap_or_default()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Trim a cell and map every empty spelling to `None`.
pub fn normalize_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if EMPTY_SPELLINGS.contains(&trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

/// Cell text to write for an optional value.
pub fn write_cell(value: Option<&str>) -> String {
    value
        .and_then(normalize_cell)
        .unwrap_or(EMPTY_MARKER)
        .to_string()
}

/// Split a `,` or `;` separated cell, dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .filter_map(normalize_cell)
        .map(str::to_string)
        .collect()
}

pub fn join_list(items: &[String]) -> String {
    if items.is_empty() {
        EMPTY_MARKER.to_string()
    } else {
        items.join(", ")
    }
}

fn same_header(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Header of a written table: the canonical columns, then every other
/// column the rows carry, in first-seen order.
pub fn table_header(canonical: &[&str], rows: &[Row]) -> Vec<String> {
    let mut header: Vec<String> = canonical.iter().map(|c| c.to_string()).collect();
    for key in rows.iter().flat_map(Row::headers) {
        if !header.iter().any(|h| same_header(h, key)) {
            header.push(key.to_string());
        }
    }
    header
}

/// One written record laid out under `header`. Canonical cells are
/// normalised; any other cell is written back exactly as loaded.
pub fn table_record(row: &Row, header: &[String], canonical: &[&str]) -> Vec<String> {
    header
        .iter()
        .map(|column| {
            if canonical.iter().any(|c| same_header(c, column)) {
                write_cell(row.value(column))
            } else {
                row.raw(column).unwrap_or_default().to_string()
            }
        })
        .collect()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = normalize_cell(raw)?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| EMPTY_MARKER.to_string())
}

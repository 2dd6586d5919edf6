use std::path::{Path, PathBuf};

use tracing::debug;

use super::records::{DRONE_COLUMNS, PILOT_COLUMNS};
use super::row::{table_header, table_record, Row};
use super::{Storage, StoreError};

pub const PILOT_FILE: &str = "pilot_roster.csv";
pub const DRONE_FILE: &str = "drone_fleet.csv";
pub const MISSIONS_FILE: &str = "missions.csv";

/// Flat CSV files, one per table, inside a data directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    data_dir: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn table_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    fn read_table(&self, file: &str) -> Result<Vec<Row>, StoreError> {
        let path = self.table_path(file);
        let csv_err = |source: csv::Error| StoreError::Csv {
            path: path.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?.clone();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            rows.push(Row::from_pairs(headers.iter().zip(record.iter())));
        }

        debug!(path = %path.display(), rows = rows.len(), "Read table");
        Ok(rows)
    }

    /// Write to a sibling temp file, then rename over the target. Columns
    /// beyond the canonical set are kept after it.
    fn write_table(&self, file: &str, columns: &[&str], rows: &[Row]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let path = self.table_path(file);
        let tmp_path = path.with_extension("csv.tmp");
        let csv_err = |source: csv::Error| StoreError::Csv {
            path: tmp_path.clone(),
            source,
        };

        let header = table_header(columns, rows);
        let mut writer = csv::Writer::from_path(&tmp_path).map_err(csv_err)?;
        writer.write_record(&header).map_err(csv_err)?;
        for row in rows {
            writer
                .write_record(table_record(row, &header, columns))
                .map_err(csv_err)?;
        }
        writer.flush().map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        drop(writer);

        std::fs::rename(&tmp_path, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), rows = rows.len(), "Wrote table");
        Ok(())
    }
}

impl Storage for CsvStore {
    async fn read_pilots(&self) -> Result<Vec<Row>, StoreError> {
        self.read_table(PILOT_FILE)
    }

    async fn read_drones(&self) -> Result<Vec<Row>, StoreError> {
        self.read_table(DRONE_FILE)
    }

    async fn read_missions(&self) -> Result<Vec<Row>, StoreError> {
        self.read_table(MISSIONS_FILE)
    }

    async fn write_pilots(&self, rows: &[Row]) -> Result<(), StoreError> {
        self.write_table(PILOT_FILE, PILOT_COLUMNS, rows)
    }

    async fn write_drones(&self, rows: &[Row]) -> Result<(), StoreError> {
        self.write_table(DRONE_FILE, DRONE_COLUMNS, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::row::EMPTY_MARKER;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[tokio::test]
    async fn test_read_pilots_normalizes_cells() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            PILOT_FILE,
            "pilot_id,name,skills,certifications,location,status,current_assignment\n\
             P001, Arjun ,\"Mapping, Survey\",DGCA,Bangalore,Available,–\n\
             ,,,,,,\n\
             P002,Neha,Inspection,DGCA,Mumbai,Assigned,PRJ002\n",
        );

        let store = CsvStore::new(dir.path().to_path_buf());
        let rows = store.read_pilots().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value("name"), Some("Arjun"));
        assert_eq!(rows[0].value("current_assignment"), None);
        assert_eq!(rows[1].value("current_assignment"), Some("PRJ002"));
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().to_path_buf());
        let err = store.read_missions().await.unwrap_err();
        assert!(matches!(err, StoreError::Csv { .. }));
    }

    #[tokio::test]
    async fn test_write_pilots_uses_canonical_columns_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("nested"));
        let row = Row::from_pairs([
            ("pilot_id", "P003"),
            ("name", "Rohit"),
            ("status", "On Leave"),
            ("current_assignment", ""),
        ]);
        store.write_pilots(&[row]).await.unwrap();

        let contents = std::fs::read_to_string(dir.path().join("nested").join(PILOT_FILE)).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(PILOT_COLUMNS.join(",").as_str()));
        let data = lines.next().unwrap();
        assert!(data.starts_with("P003,Rohit,"));
        assert!(data.contains("On Leave"));
        assert!(data.contains(EMPTY_MARKER));
        assert!(!dir.path().join("nested").join("pilot_roster.csv.tmp").exists());
    }
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::models::{Drone, Pilot, Project};

use super::records::{drones_to_rows, pilots_to_rows, projects_to_rows};
use super::row::Row;
use super::{Storage, StoreError};

#[derive(Debug, Default)]
struct Tables {
    pilots: Vec<Row>,
    drones: Vec<Row>,
    missions: Vec<Row>,
}

/// In-process tables. Writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new(pilots: Vec<Row>, drones: Vec<Row>, missions: Vec<Row>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                pilots,
                drones,
                missions,
            }),
            ..Self::default()
        }
    }

    pub fn from_records(pilots: &[Pilot], drones: &[Drone], missions: &[Project]) -> Self {
        Self::new(
            pilots_to_rows(pilots, &[]),
            drones_to_rows(drones, &[]),
            projects_to_rows(missions),
        )
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn pilot_rows(&self) -> Vec<Row> {
        self.lock().pilots.clone()
    }

    pub fn drone_rows(&self) -> Vec<Row> {
        self.lock().drones.clone()
    }

    /// Number of successful writes across both writable tables.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store rejecting writes".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Storage for MemoryStore {
    async fn read_pilots(&self) -> Result<Vec<Row>, StoreError> {
        Ok(self.lock().pilots.clone())
    }

    async fn read_drones(&self) -> Result<Vec<Row>, StoreError> {
        Ok(self.lock().drones.clone())
    }

    async fn read_missions(&self) -> Result<Vec<Row>, StoreError> {
        Ok(self.lock().missions.clone())
    }

    async fn write_pilots(&self, rows: &[Row]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.lock().pilots = rows.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn write_drones(&self, rows: &[Row]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.lock().drones = rows.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fail_writes_leaves_tables_untouched() {
        let store = MemoryStore::new(vec![Row::new().with("pilot_id", "P001")], vec![], vec![]);
        store.set_fail_writes(true);

        let err = store.write_pilots(&[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.pilot_rows().len(), 1);
        assert_eq!(store.write_count(), 0);

        store.set_fail_writes(false);
        store.write_pilots(&[]).await.unwrap();
        assert!(store.pilot_rows().is_empty());
        assert_eq!(store.write_count(), 1);
    }
}

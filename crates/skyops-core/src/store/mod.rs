//! Storage collaborators for the roster, fleet and mission tables.
//!
//! - `CsvStore`: local flat files in a data directory
//! - `SheetsStore`: Google Sheets, one spreadsheet per table
//! - `MemoryStore`: in-process tables for embedding and tests
//! - `Mirrored`: a remote store backed by a local copy; failed remote reads
//!   fall back to the copy and successful remote writes are mirrored to it
//! - `Backend`: the configured choice, local files or Sheets mirrored locally
//!
//! Missions are read-only, so there is no mission write path.

pub mod credentials;
pub mod error;
pub mod local;
pub mod memory;
pub mod records;
pub mod row;
pub mod sheets;

use std::future::Future;

use tracing::{debug, warn};

use crate::error::Table;

pub use credentials::TokenStore;
pub use error::{SheetsError, StoreError};
pub use local::CsvStore;
pub use memory::MemoryStore;
pub use row::{Row, EMPTY_MARKER};
pub use sheets::{SheetIds, SheetsStore};

/// Contract every backing store fulfils. Rows come back in source order.
pub trait Storage {
    fn read_pilots(&self) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;
    fn read_drones(&self) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;
    fn read_missions(&self) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;
    fn write_pilots(&self, rows: &[Row]) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn write_drones(&self, rows: &[Row]) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A remote store with a local mirror.
#[derive(Debug, Clone)]
pub struct Mirrored<R, L> {
    remote: R,
    mirror: L,
}

impl<R, L> Mirrored<R, L> {
    pub fn new(remote: R, mirror: L) -> Self {
        Self { remote, mirror }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn mirror(&self) -> &L {
        &self.mirror
    }
}

async fn read_with_fallback<F>(
    table: Table,
    remote: Result<Vec<Row>, StoreError>,
    local: F,
) -> Result<Vec<Row>, StoreError>
where
    F: Future<Output = Result<Vec<Row>, StoreError>>,
{
    match remote {
        Ok(rows) => Ok(rows),
        Err(e) => {
            warn!(%table, error = %e, "Remote read failed, falling back to local files");
            local.await
        }
    }
}

/// Keep the local copy in step after a successful remote write.
fn log_mirror_result(table: Table, result: Result<(), StoreError>) {
    match result {
        Ok(()) => debug!(%table, "Mirrored to local files"),
        Err(e) => warn!(%table, error = %e, "Failed to mirror remote write to local files"),
    }
}

impl<R, L> Storage for Mirrored<R, L>
where
    R: Storage + Sync,
    L: Storage + Sync,
{
    async fn read_pilots(&self) -> Result<Vec<Row>, StoreError> {
        read_with_fallback(Table::Pilots, self.remote.read_pilots().await, self.mirror.read_pilots())
            .await
    }

    async fn read_drones(&self) -> Result<Vec<Row>, StoreError> {
        read_with_fallback(Table::Drones, self.remote.read_drones().await, self.mirror.read_drones())
            .await
    }

    async fn read_missions(&self) -> Result<Vec<Row>, StoreError> {
        read_with_fallback(
            Table::Missions,
            self.remote.read_missions().await,
            self.mirror.read_missions(),
        )
        .await
    }

    /// A failed remote write is returned as is; the mirror is left alone.
    async fn write_pilots(&self, rows: &[Row]) -> Result<(), StoreError> {
        self.remote.write_pilots(rows).await?;
        log_mirror_result(Table::Pilots, self.mirror.write_pilots(rows).await);
        Ok(())
    }

    async fn write_drones(&self, rows: &[Row]) -> Result<(), StoreError> {
        self.remote.write_drones(rows).await?;
        log_mirror_result(Table::Drones, self.mirror.write_drones(rows).await);
        Ok(())
    }
}

/// The storage selected by configuration.
pub enum Backend {
    Local(CsvStore),
    Sheets(Mirrored<SheetsStore, CsvStore>),
}

impl Backend {
    pub fn describe(&self) -> String {
        match self {
            Backend::Local(store) => format!("local files in {}", store.data_dir().display()),
            Backend::Sheets(store) => format!(
                "Google Sheets, mirrored to {}",
                store.mirror().data_dir().display()
            ),
        }
    }
}

impl Storage for Backend {
    async fn read_pilots(&self) -> Result<Vec<Row>, StoreError> {
        match self {
            Backend::Local(store) => store.read_pilots().await,
            Backend::Sheets(store) => store.read_pilots().await,
        }
    }

    async fn read_drones(&self) -> Result<Vec<Row>, StoreError> {
        match self {
            Backend::Local(store) => store.read_drones().await,
            Backend::Sheets(store) => store.read_drones().await,
        }
    }

    async fn read_missions(&self) -> Result<Vec<Row>, StoreError> {
        match self {
            Backend::Local(store) => store.read_missions().await,
            Backend::Sheets(store) => store.read_missions().await,
        }
    }

    async fn write_pilots(&self, rows: &[Row]) -> Result<(), StoreError> {
        match self {
            Backend::Local(store) => store.write_pilots(rows).await,
            Backend::Sheets(store) => store.write_pilots(rows).await,
        }
    }

    async fn write_drones(&self, rows: &[Row]) -> Result<(), StoreError> {
        match self {
            Backend::Local(store) => store.write_drones(rows).await,
            Backend::Sheets(store) => store.write_drones(rows).await,
        }
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Which kind of record an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Pilot,
    Drone,
    Project,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Pilot => write!(f, "Pilot"),
            EntityKind::Drone => write!(f, "Drone"),
            EntityKind::Project => write!(f, "Project"),
        }
    }
}

/// A persisted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Pilots,
    Drones,
    Missions,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Table::Pilots => write!(f, "pilot roster"),
            Table::Drones => write!(f, "drone fleet"),
            Table::Missions => write!(f, "missions"),
        }
    }
}

#[derive(Error, Debug)]
pub enum OpsError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The in-memory mutation was applied but the write-through failed.
    /// `Session::sync` retries it.
    #[error("Updated in memory but failed to sync {table}: {source}")]
    PersistenceFailed {
        table: Table,
        #[source]
        source: StoreError,
    },

    #[error("Malformed {table} row {row}: {reason}")]
    MalformedRow {
        table: Table,
        row: usize,
        reason: String,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Coarse error category handed to the presentation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidValue,
    Conflict,
    PersistenceFailed,
    Storage,
    Internal,
}

impl OpsError {
    pub fn not_found(entity: EntityKind, id: &str) -> Self {
        OpsError::NotFound {
            entity,
            id: id.trim().to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OpsError::NotFound { .. } => ErrorKind::NotFound,
            OpsError::InvalidValue(_) => ErrorKind::InvalidValue,
            OpsError::Conflict(_) => ErrorKind::Conflict,
            OpsError::PersistenceFailed { .. } => ErrorKind::PersistenceFailed,
            OpsError::MalformedRow { .. } | OpsError::Storage(_) => ErrorKind::Storage,
        }
    }
}

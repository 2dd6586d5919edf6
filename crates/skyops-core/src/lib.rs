//! Core library for skyops.
//!
//! Coordinates a small fleet of drone pilots, drones and missions:
//!
//! - `models`: `Pilot`, `Drone`, `Project` and the `Conflict` records
//! - `store`: storage collaborators (local CSV files, Google Sheets, memory)
//! - `repository`: typed, snapshot-returning access to the loaded tables
//! - `engine`: side-effect free matching and conflict detection
//! - `session`: the orchestrator owning the tables and the write-through
//! - `dispatch`: the closed request set and the structured error boundary
//! - `config`: file + environment configuration and backend selection

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
#[cfg(test)]
mod fixtures;
pub mod models;
pub mod repository;
pub mod session;
pub mod store;
pub mod utils;

pub use config::Config;
pub use dispatch::{handle, ErrorResult, Request, Response};
pub use error::{EntityKind, ErrorKind, OpsError, Table};
pub use models::{
    Conflict, ConflictKind, DateRange, Drone, DroneFilter, DroneStatus, Pilot, PilotFilter,
    PilotStatus, Project, ReassignmentBundle,
};
pub use repository::Repository;
pub use session::Session;
pub use store::{
    Backend, CsvStore, MemoryStore, Mirrored, Row, SheetsStore, Storage, StoreError,
};

//! Configuration management.
//!
//! Settings come from `~/.config/skyops/config.json` (when present) and are
//! overridden by environment variables:
//!
//! - `SKYOPS_DATA_DIR`: directory holding the CSV tables
//! - `PILOT_SHEET_ID`, `DRONE_SHEET_ID`, `MISSIONS_SHEET_ID`: spreadsheets
//! - `SKYOPS_WORKSHEET`: worksheet name inside each spreadsheet
//! - `SHEETS_ACCESS_TOKEN`: bearer token, otherwise read from the keychain
//! - `SKYOPS_LOG_DIR`: write logs to files in this directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::{Backend, CsvStore, Mirrored, SheetIds, SheetsStore, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "skyops";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Data directory used when it exists in the working directory
const LOCAL_DATA_DIR: &str = "data";

pub const ENV_DATA_DIR: &str = "SKYOPS_DATA_DIR";
pub const ENV_PILOT_SHEET: &str = "PILOT_SHEET_ID";
pub const ENV_DRONE_SHEET: &str = "DRONE_SHEET_ID";
pub const ENV_MISSIONS_SHEET: &str = "MISSIONS_SHEET_ID";
pub const ENV_WORKSHEET: &str = "SKYOPS_WORKSHEET";
pub const ENV_ACCESS_TOKEN: &str = "SHEETS_ACCESS_TOKEN";
pub const ENV_LOG_DIR: &str = "SKYOPS_LOG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub pilot_sheet_id: Option<String>,
    pub drone_sheet_id: Option<String>,
    pub missions_sheet_id: Option<String>,
    pub worksheet: Option<String>,
    pub log_dir: Option<PathBuf>,
    /// Only ever taken from the environment or the keychain.
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl Config {
    /// Config file overlaid with the process environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Override settings with non-empty values from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(dir) = get(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(id) = get(ENV_PILOT_SHEET) {
            self.pilot_sheet_id = Some(id);
        }
        if let Some(id) = get(ENV_DRONE_SHEET) {
            self.drone_sheet_id = Some(id);
        }
        if let Some(id) = get(ENV_MISSIONS_SHEET) {
            self.missions_sheet_id = Some(id);
        }
        if let Some(name) = get(ENV_WORKSHEET) {
            self.worksheet = Some(name);
        }
        if let Some(token) = get(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
    }

    /// Configured directory, else `./data` when present, else the
    /// platform data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let local = Path::new(LOCAL_DATA_DIR);
        if local.is_dir() {
            return Ok(local.to_path_buf());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// All three spreadsheet ids, or `None` if any is missing.
    pub fn sheet_ids(&self) -> Option<SheetIds> {
        Some(SheetIds {
            pilots: self.pilot_sheet_id.clone()?,
            drones: self.drone_sheet_id.clone()?,
            missions: self.missions_sheet_id.clone()?,
        })
    }

    /// Token from the environment, else from the OS keychain.
    pub fn access_token(&self) -> Option<String> {
        if let Some(ref token) = self.access_token {
            return Some(token.clone());
        }
        match TokenStore::get() {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "No access token available from keychain");
                None
            }
        }
    }

    /// Spreadsheets when all ids and a token are available, else local files.
    pub fn backend(&self) -> Result<Backend> {
        let local = CsvStore::new(self.data_dir()?);

        let Some(sheets) = self.sheet_ids() else {
            return Ok(Backend::Local(local));
        };
        let Some(token) = self.access_token() else {
            warn!("Spreadsheet ids configured but no access token found, using local files");
            return Ok(Backend::Local(local));
        };

        let remote = SheetsStore::new(sheets, self.worksheet.clone(), token)
            .context("Failed to create Sheets client")?;
        Ok(Backend::Sheets(Mirrored::new(remote, local)))
    }
}

//! Spreadsheet access token storage in the OS keychain.

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "skyops";
const TOKEN_ACCOUNT: &str = "google-sheets";

pub struct TokenStore;

impl TokenStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_ACCOUNT).context("Failed to open keychain entry")
    }

    pub fn store(token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store access token in keychain")
    }

    /// `Ok(None)` when no token has been stored.
    pub fn get() -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read access token from keychain"),
        }
    }

    pub fn delete() -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete access token from keychain"),
        }
    }
}

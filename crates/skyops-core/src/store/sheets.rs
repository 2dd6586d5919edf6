//! Google Sheets backend using the v4 values API.
//!
//! Each table lives in its own spreadsheet; the first row of the worksheet
//! holds the headers. Writes clear the worksheet and rewrite it whole.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::records::{DRONE_COLUMNS, PILOT_COLUMNS};
use super::row::{table_header, table_record, Row};
use super::{SheetsError, Storage, StoreError};

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the Sheets v4 spreadsheets resource.
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Cells are stored exactly as sent. Parsed input would turn ISO dates into
/// date cells, which read back in the spreadsheet's locale format.
const VALUE_INPUT_OPTION: &str = "RAW";

/// Worksheet used when none is configured.
pub const DEFAULT_WORKSHEET: &str = "Sheet1";

/// Spreadsheet ids for the three tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetIds {
    pub pilots: String,
    pub drones: String,
    pub missions: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<String>>,
}

/// Spreadsheet client. Clone shares the connection pool.
#[derive(Clone)]
pub struct SheetsStore {
    client: Client,
    token: String,
    sheets: SheetIds,
    worksheet: String,
}

impl SheetsStore {
    pub fn new(sheets: SheetIds, worksheet: Option<String>, token: String) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            token,
            sheets,
            worksheet: worksheet.unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
        })
    }

    fn values_url(&self, sheet_id: &str, suffix: &str) -> Result<Url, SheetsError> {
        values_url(sheet_id, &self.worksheet, suffix)
    }

    /// Send a request, backing off and retrying while rate limited.
    async fn send<F>(&self, url: &Url, build: F) -> Result<reqwest::Response, SheetsError>
    where
        F: Fn(&Client, Url) -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build(&self.client, url.clone())
                .bearer_auth(&self.token)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status.as_u16() != 429 {
                let body = response.text().await.unwrap_or_default();
                return Err(SheetsError::from_status(status, &body));
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(SheetsError::QuotaExceeded);
            }
            warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2;
        }
    }

    async fn read_sheet(&self, sheet_id: &str) -> Result<Vec<Row>, StoreError> {
        let url = self.values_url(sheet_id, "")?;
        let response = self.send(&url, |client, url| client.get(url)).await?;
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsError::UnexpectedReply(e.to_string()))?;

        let rows = rows_from_values(range.values);
        debug!(sheet = sheet_id, rows = rows.len(), "Read worksheet");
        Ok(rows)
    }

    async fn write_sheet(&self, sheet_id: &str, columns: &[&str], rows: &[Row]) -> Result<(), StoreError> {
        let clear_url = self.values_url(sheet_id, ":clear")?;
        self.send(&clear_url, |client, url| client.post(url).json(&serde_json::json!({})))
            .await?;

        let url = update_url(sheet_id, &self.worksheet)?;
        let body = ValueRangeBody {
            range: &self.worksheet,
            major_dimension: "ROWS",
            values: values_from_rows(columns, rows),
        };
        self.send(&url, |client, url| client.put(url).json(&body)).await?;

        debug!(sheet = sheet_id, rows = rows.len(), "Wrote worksheet");
        Ok(())
    }
}

impl std::fmt::Debug for SheetsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsStore")
            .field("sheets", &self.sheets)
            .field("worksheet", &self.worksheet)
            .finish_non_exhaustive()
    }
}

impl Storage for SheetsStore {
    async fn read_pilots(&self) -> Result<Vec<Row>, StoreError> {
        self.read_sheet(&self.sheets.pilots).await
    }

    async fn read_drones(&self) -> Result<Vec<Row>, StoreError> {
        self.read_sheet(&self.sheets.drones).await
    }

    async fn read_missions(&self) -> Result<Vec<Row>, StoreError> {
        self.read_sheet(&self.sheets.missions).await
    }

    async fn write_pilots(&self, rows: &[Row]) -> Result<(), StoreError> {
        self.write_sheet(&self.sheets.pilots, PILOT_COLUMNS, rows).await
    }

    async fn write_drones(&self, rows: &[Row]) -> Result<(), StoreError> {
        self.write_sheet(&self.sheets.drones, DRONE_COLUMNS, rows).await
    }
}

// ===== Value conversion =====

fn values_url(sheet_id: &str, worksheet: &str, suffix: &str) -> Result<Url, SheetsError> {
    let mut url = Url::parse(SHEETS_API_BASE)
        .map_err(|e| SheetsError::UnexpectedReply(format!("Bad API base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| SheetsError::UnexpectedReply("API base cannot hold a path".to_string()))?
        .push(sheet_id)
        .push("values")
        .push(&format!("{}{}", worksheet, suffix));
    Ok(url)
}

fn update_url(sheet_id: &str, worksheet: &str) -> Result<Url, SheetsError> {
    let mut url = values_url(sheet_id, worksheet, "")?;
    url.query_pairs_mut()
        .append_pair("valueInputOption", VALUE_INPUT_OPTION);
    Ok(url)
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// First row is the header; short rows are padded with empty cells.
fn rows_from_values(values: Vec<Vec<Value>>) -> Vec<Row> {
    let mut iter = values.into_iter();
    let headers: Vec<String> = match iter.next() {
        Some(header) => header.into_iter().map(cell_text).collect(),
        None => return Vec::new(),
    };

    iter.map(|cells| {
        let mut cells = cells.into_iter().map(cell_text);
        Row::from_pairs(
            headers
                .iter()
                .map(|h| (h.clone(), cells.next().unwrap_or_default())),
        )
    })
    .filter(|row| row.headers().any(|h| row.value(h).is_some()))
    .collect()
}

fn values_from_rows(columns: &[&str], rows: &[Row]) -> Vec<Vec<String>> {
    let header = table_header(columns, rows);
    let mut values = Vec::with_capacity(rows.len() + 1);
    values.push(header.clone());
    for row in rows {
        values.push(table_record(row, &header, columns));
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_values_url() {
        let url = values_url("abc123", "Sheet1", "").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Sheet1"
        );

        let url = values_url("abc123", "Roster Q3", ":clear").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Roster%20Q3:clear"
        );
    }

    #[test]
    fn test_update_url_stores_cells_as_text() {
        let url = update_url("abc123", "Sheet1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Sheet1?valueInputOption=RAW"
        );
    }

    #[test]
    fn test_rows_from_values_pads_short_rows() {
        let values: ValueRange = serde_json::from_value(json!({
            "range": "Sheet1!A1:C3",
            "values": [
                ["drone_id", "model", "maintenance_due"],
                ["D001", "DJI M300"],
                ["", "", ""],
                ["D002", "Mavic 3", "2026-03-01"]
            ]
        }))
        .unwrap();

        let rows = rows_from_values(values.values);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value("drone_id"), Some("D001"));
        assert_eq!(rows[0].value("maintenance_due"), None);
        assert_eq!(rows[1].value("maintenance_due"), Some("2026-03-01"));
    }

    #[test]
    fn test_rows_from_values_empty_sheet() {
        let values: ValueRange = serde_json::from_value(json!({ "range": "Sheet1" })).unwrap();
        assert!(rows_from_values(values.values).is_empty());
    }

    #[test]
    fn test_values_from_rows_writes_header_and_marker() {
        let row = Row::new().with("drone_id", "D001").with("status", "Available");
        let values = values_from_rows(&["drone_id", "status", "location"], &[row]);
        assert_eq!(values[0], vec!["drone_id", "status", "location"]);
        assert_eq!(values[1], vec!["D001", "Available", "–"]);
    }

    #[test]
    fn test_values_from_rows_keeps_extra_columns() {
        let row = Row::new()
            .with("drone_id", "D001")
            .with("serial", "SN-4471")
            .with("status", "Available");
        let values = values_from_rows(&["drone_id", "status"], &[row]);
        assert_eq!(values[0], vec!["drone_id", "status", "serial"]);
        assert_eq!(values[1], vec!["D001", "Available", "SN-4471"]);
    }

    #[test]
    fn test_cell_text_non_string() {
        assert_eq!(cell_text(json!(42)), "42");
        assert_eq!(cell_text(json!(null)), "");
        assert_eq!(cell_text(json!("x")), "x");
    }
}

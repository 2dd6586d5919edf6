use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Failures talking to the Sheets values API.
#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Spreadsheet access denied (check sharing): {0}")]
    PermissionDenied(String),

    #[error("Access token rejected; run `skyops login` with a fresh token")]
    TokenRejected,

    #[error("Spreadsheet or worksheet not found: {0}")]
    SheetNotFound(String),

    #[error("Sheets quota exceeded, still rate limited after retries")]
    QuotaExceeded,

    #[error("Sheets service error: {0}")]
    Service(String),

    #[error("Could not reach Google Sheets: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected Sheets reply: {0}")]
    UnexpectedReply(String),
}

/// Longest excerpt of an error reply kept in messages and logs.
const MAX_REPLY_EXCERPT: usize = 300;

impl SheetsError {
    /// Google wraps failures as `{"error": {"message": ...}}`; fall back to
    /// the raw body, cut at a char boundary.
    fn reply_message(body: &str) -> String {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());

        if message.len() <= MAX_REPLY_EXCERPT {
            return message;
        }
        let cut = (0..=MAX_REPLY_EXCERPT)
            .rev()
            .find(|&i| message.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}... ({} bytes)", &message[..cut], message.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::reply_message(body);
        match status.as_u16() {
            401 => SheetsError::TokenRejected,
            403 => SheetsError::PermissionDenied(message),
            404 => SheetsError::SheetNotFound(message),
            429 => SheetsError::QuotaExceeded,
            500..=599 => SheetsError::Service(message),
            _ => SheetsError::UnexpectedReply(format!("HTTP {}: {}", status, message)),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Spreadsheet sync failed: {0}")]
    Sheets(#[from] SheetsError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            SheetsError::from_status(StatusCode::UNAUTHORIZED, ""),
            SheetsError::TokenRejected
        ));
        assert!(matches!(
            SheetsError::from_status(StatusCode::FORBIDDEN, "no"),
            SheetsError::PermissionDenied(_)
        ));
        assert!(matches!(
            SheetsError::from_status(StatusCode::NOT_FOUND, "gone"),
            SheetsError::SheetNotFound(_)
        ));
        assert!(matches!(
            SheetsError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            SheetsError::QuotaExceeded
        ));
        assert!(matches!(
            SheetsError::from_status(StatusCode::BAD_GATEWAY, ""),
            SheetsError::Service(_)
        ));
        assert!(matches!(
            SheetsError::from_status(StatusCode::BAD_REQUEST, ""),
            SheetsError::UnexpectedReply(_)
        ));
    }

    #[test]
    fn test_google_error_message_is_extracted() {
        let body = r#"{"error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}}"#;
        let err = SheetsError::from_status(StatusCode::FORBIDDEN, body);
        assert_eq!(
            err.to_string(),
            "Spreadsheet access denied (check sharing): The caller does not have permission"
        );
    }

    #[test]
    fn test_long_reply_is_cut_on_char_boundary() {
        let long = "é".repeat(MAX_REPLY_EXCERPT);
        let message = SheetsError::reply_message(&long);
        assert!(message.ends_with(&format!("({} bytes)", long.len())));
        assert!(message.len() < long.len());
        assert_eq!(SheetsError::reply_message(" short "), "short");
    }
}

//! Error types for qnlink core

use qnlink_types::TimestampParseError;
use thiserror::Error;

/// Errors that can occur while building or signing links
#[derive(Debug, Error)]
pub enum QnlinkError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(#[from] TimestampParseError),

    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(i64),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QnlinkError {
    /// Errors caused by malformed caller input rather than runtime conditions
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            QnlinkError::InvalidTimestamp(_)
                | QnlinkError::TimestampOutOfRange(_)
                | QnlinkError::InvalidUrl { .. }
        )
    }

    pub(crate) fn invalid_url(url: &str, reason: impl ToString) -> Self {
        QnlinkError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<QnlinkError> for String {
    fn from(error: QnlinkError) -> Self {
        error.to_string()
    }
}

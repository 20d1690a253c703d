//! Shared types for qnlink
//!
//! This crate contains the data structures shared between the core
//! library and the CLI.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Timestamp Types
// ============================================================================

/// Whole seconds elapsed since the (local) Unix epoch base
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> i64 {
        self.0
    }

    /// Lowercase hexadecimal form, as carried by the anti-leech `t` parameter
    pub fn to_hex(&self) -> String {
        format!("{:x}", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned when a timestamp string is not a plain decimal integer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timestamp {input:?}: {reason}")]
pub struct TimestampParseError {
    pub input: String,
    pub reason: String,
}

impl FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Timestamp)
            .map_err(|e| TimestampParseError {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<i64> for Timestamp {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

// ============================================================================
// Fetch Types
// ============================================================================

/// Status codes carried by [`FetchResult::code`] that are not HTTP statuses
pub mod http_code {
    /// No request has completed yet
    pub const UNDEFINED: i32 = 0;
    pub const OK: i32 = 200;
    /// The failure happened locally (transport exception, file write, ...)
    pub const USER_EXCEPTION: i32 = -1;
}

/// Format used for the wall-clock prefix of every diagnostic line
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Outcome of a single fetch call
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    /// HTTP status, or [`http_code::USER_EXCEPTION`]
    pub code: i32,
    /// Response body, when the server answered
    #[serde(skip)]
    pub payload: Option<Bytes>,
    /// Accumulated diagnostic trace, one `\n`-terminated line per event
    pub log: String,
}

impl FetchResult {
    pub fn new() -> Self {
        Self {
            code: http_code::UNDEFINED,
            payload: None,
            log: String::new(),
        }
    }

    /// Whether the remote answered with a 2xx status and nothing failed locally
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_user_exception(&self) -> bool {
        self.code == http_code::USER_EXCEPTION
    }

    /// Append one line, prefixed with `at`
    pub fn append_log(&mut self, at: DateTime<FixedOffset>, line: &str) {
        self.log.push_str(&format!("[{}] {}\n", at.format(LOG_TIME_FORMAT), line));
    }

    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.log.lines()
    }

    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for FetchResult {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "code: {}", self.code)?;
        writeln!(f, "bytes: {}", self.payload_len())?;
        write!(f, "{}", self.log)
    }
}

// ============================================================================
// Settings Types
// ============================================================================

pub const DEFAULT_EXPIRE_SECS: i64 = 3600;

/// Persistent client settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Account access key, placed in front of download tokens
    pub access_key: String,
    /// Account secret key used to sign download tokens
    pub secret_key: String,
    /// Lifetime of generated links when none is given
    pub default_expire_secs: i64,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            default_expire_secs: DEFAULT_EXPIRE_SECS,
            user_agent: format!("qnlink/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: 30,
            request_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("default_expire_secs", &self.default_expire_secs)
            .field("user_agent", &self.user_agent)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Settings {
    /// True when both halves of the credential pair are present
    pub fn has_credentials(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_parse() {
        assert_eq!("1500000000".parse::<Timestamp>().unwrap().as_secs(), 1_500_000_000);
        assert_eq!("-5".parse::<Timestamp>().unwrap().as_secs(), -5);
        assert!("15e8".parse::<Timestamp>().is_err());
        assert!("".parse::<Timestamp>().is_err());
        assert!(" 123 ".parse::<Timestamp>().is_err());
        assert!("123\n".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_timestamp_hex() {
        assert_eq!(Timestamp::from_secs(0x55cc_c3a0).to_hex(), "55ccc3a0");
    }

    #[test]
    fn test_fetch_result_log_lines() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let at = offset.with_ymd_and_hms(2017, 3, 1, 12, 30, 5).unwrap();

        let mut result = FetchResult::new();
        result.append_log(at, "first");
        result.append_log(at, "second");

        assert!(result.log.ends_with('\n'));
        let lines: Vec<_> = result.log_lines().collect();
        assert_eq!(lines, vec!["[2017-03-01 12:30:05.000] first", "[2017-03-01 12:30:05.000] second"]);
    }

    #[test]
    fn test_fetch_result_status() {
        let mut result = FetchResult::new();
        assert!(!result.is_ok());
        result.code = 204;
        assert!(result.is_ok());
        result.code = http_code::USER_EXCEPTION;
        assert!(result.is_user_exception());
        assert!(!result.is_ok());
    }

    #[test]
    fn test_settings_defaults_fill_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"access_key":"ak"}"#).unwrap();
        assert_eq!(settings.access_key, "ak");
        assert_eq!(settings.default_expire_secs, DEFAULT_EXPIRE_SECS);
        assert!(!settings.has_credentials());
    }
}

//! Timestamp anti-leech (hotlink protection) links
//!
//! A protected link carries `sign` and `t` query parameters. `t` is the
//! expiry timestamp in lowercase hex and `sign` is the token produced over
//! `key + escaped path + t`.

use crate::auth::Signer;
use crate::clock::Clock;
use crate::error::QnlinkError;
use crate::timestamp;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use qnlink_types::Timestamp;
use url::{Position, Url};

/// Bytes escaped in the signed path. `%` is left alone so already-escaped
/// paths are not escaped twice.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The pieces of a URL the anti-leech scheme works with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    /// Scheme and authority, e.g. `http://cdn.example.com:8080`
    pub host: String,
    /// Directory part, from the leading `/` through the last `/`
    pub path: String,
    /// Final path segment
    pub file: String,
    /// `?` and everything after it up to the fragment, or empty
    pub query: String,
}

/// Split `url` into host, path, file and query.
///
/// The fragment is dropped. Hosts are normalized by the URL parser, so
/// internationalized names come back in punycode. URLs without a host are
/// rejected.
pub fn split_url(url: &str) -> Result<UrlParts, QnlinkError> {
    let parsed = Url::parse(url).map_err(|e| QnlinkError::invalid_url(url, e))?;
    if !parsed.has_host() {
        return Err(QnlinkError::invalid_url(url, "no host"));
    }

    let host = parsed[..Position::AfterPort].to_string();
    let full_path = match parsed.path() {
        "" => "/",
        path => path,
    };
    let (path, file) = match full_path.rfind('/') {
        Some(idx) => full_path.split_at(idx + 1),
        None => ("/", full_path),
    };
    let query = parsed
        .query()
        .map(|q| format!("?{}", q))
        .unwrap_or_default();

    Ok(UrlParts {
        host,
        path: path.to_string(),
        file: file.to_string(),
        query,
    })
}

/// Request for a timestamp anti-leech link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AntiLeechRequest {
    original_url: Option<String>,
    pub host: String,
    pub path: String,
    pub file: String,
    pub query: String,
    /// Anti-leech key configured for the domain
    pub key: String,
    timestamp: Option<Timestamp>,
}

impl AntiLeechRequest {
    /// Empty request, to be filled in part by part
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        host: impl Into<String>,
        path: impl Into<String>,
        file: impl Into<String>,
        query: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            original_url: None,
            host: host.into(),
            path: path.into(),
            file: file.into(),
            query: query.into(),
            key: key.into(),
            timestamp: None,
        }
    }

    /// Request for an existing URL, expiring `expire_secs` from now
    pub fn from_url<C: Clock + ?Sized>(
        url: &str,
        key: impl Into<String>,
        expire_secs: i64,
        clock: &C,
    ) -> Result<Self, QnlinkError> {
        let parts = split_url(url)?;
        let mut request = Self {
            original_url: Some(url.to_string()),
            host: parts.host,
            path: parts.path,
            file: parts.file,
            query: parts.query,
            key: key.into(),
            timestamp: None,
        };
        request.set_expire_after(expire_secs, clock);
        Ok(request)
    }

    /// The URL given to [`from_url`](Self::from_url), if any
    pub fn original_url(&self) -> Option<&str> {
        self.original_url.as_deref()
    }

    /// The URL that gets signed
    pub fn raw_url(&self) -> String {
        match self.original_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("{}{}{}{}", self.host, self.path, self.file, self.query),
        }
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.timestamp = Some(timestamp);
    }

    /// Parse and set the timestamp from its decimal string form
    pub fn set_timestamp_str(&mut self, timestamp: &str) -> Result<(), QnlinkError> {
        self.timestamp = Some(timestamp.parse()?);
        Ok(())
    }

    pub fn set_expire_after<C: Clock + ?Sized>(&mut self, seconds: i64, clock: &C) {
        self.timestamp = Some(timestamp::expire_after(clock, seconds));
    }

    pub fn set_expire_at<C, Tz>(&mut self, deadline: &DateTime<Tz>, clock: &C)
    where
        C: Clock + ?Sized,
        Tz: TimeZone,
    {
        self.timestamp = Some(timestamp::datetime_to_timestamp(clock, deadline));
    }

    /// Set the expiry from a wall time in the clock's zone
    pub fn set_expire_at_local<C: Clock + ?Sized>(&mut self, deadline: NaiveDateTime, clock: &C) {
        self.timestamp = Some(timestamp::to_timestamp(clock, deadline));
    }

    fn required_timestamp(&self) -> Result<Timestamp, QnlinkError> {
        self.timestamp
            .ok_or_else(|| QnlinkError::Configuration("anti-leech timestamp is not set".into()))
    }

    /// `key + escaped path + hex timestamp`
    pub fn signing_message(&self) -> Result<String, QnlinkError> {
        if self.key.is_empty() {
            return Err(QnlinkError::Configuration("anti-leech key is not set".into()));
        }
        let timestamp = self.required_timestamp()?;
        let path = format!("{}{}", self.path, self.file);
        Ok(format!(
            "{}{}{}",
            self.key,
            utf8_percent_encode(&path, PATH),
            timestamp.to_hex()
        ))
    }

    /// The raw URL with `sign` and `t` added to its query.
    ///
    /// A fragment stays at the end, after the added parameters.
    pub fn signed_url(&self, signer: &dyn Signer) -> Result<String, QnlinkError> {
        let timestamp = self.required_timestamp()?;
        let token = signer.sign(self.signing_message()?.as_bytes())?;

        let raw = self.raw_url();
        let (base, fragment) = match raw.find('#') {
            Some(idx) => raw.split_at(idx),
            None => (raw.as_str(), ""),
        };
        let joiner = if base.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}sign={}&t={}{}",
            base,
            joiner,
            token,
            timestamp.to_hex(),
            fragment
        ))
    }
}

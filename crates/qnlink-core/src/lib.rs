//! qnlink Core - signed links and simple downloads
//!
//! This crate builds time-limited links for protected object storage
//! resources (authorized download links and timestamp anti-leech links)
//! and fetches them to local files.

mod anti_leech;
mod auth;
pub mod clock;
mod config;
mod download;
mod error;
mod signed_url;
pub mod timestamp;
mod transport;

pub use anti_leech::*;
pub use auth::*;
pub use clock::{Clock, FixedClock, WallClock};
pub use config::*;
pub use download::*;
pub use error::*;
pub use signed_url::*;
pub use transport::*;

pub use qnlink_types::{http_code, FetchResult, Settings, Timestamp, DEFAULT_EXPIRE_SECS};

use chrono::{DateTime, TimeZone};
use std::path::Path;

/// Entry point bundling settings with the system clock
#[derive(Debug, Clone)]
pub struct QnlinkCore {
    settings: Settings,
    clock: WallClock,
}

impl QnlinkCore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            clock: WallClock,
        }
    }

    /// Create from the settings file at `config_path`
    pub async fn load(config_path: &Path) -> Result<Self, QnlinkError> {
        let settings = ConfigStore::new(config_path).load().await?;
        Ok(Self::new(settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mac(&self) -> Result<Mac, QnlinkError> {
        Mac::from_settings(&self.settings)
    }

    fn expire_or_default(&self, expire_secs: Option<i64>) -> i64 {
        expire_secs.unwrap_or(self.settings.default_expire_secs)
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Authorized download link for a private bucket resource
    pub fn sign_url(&self, url: &str, expire_secs: Option<i64>) -> Result<String, QnlinkError> {
        let mac = self.mac()?;
        create_signed_url(&mac, url, Some(self.expire_or_default(expire_secs)), &self.clock)
    }

    /// Anti-leech link for `url`, expiring after `expire_secs`
    pub fn anti_leech_url(
        &self,
        url: &str,
        key: &str,
        expire_secs: Option<i64>,
    ) -> Result<String, QnlinkError> {
        let request =
            AntiLeechRequest::from_url(url, key, self.expire_or_default(expire_secs), &self.clock)?;
        request.signed_url(&HmacSigner::new(key))
    }

    /// Anti-leech link for `url`, expiring at `deadline`
    pub fn anti_leech_url_until<Tz: TimeZone>(
        &self,
        url: &str,
        key: &str,
        deadline: &DateTime<Tz>,
    ) -> Result<String, QnlinkError> {
        let mut request = AntiLeechRequest::from_url(url, key, 0, &self.clock)?;
        request.set_expire_at(deadline, &self.clock);
        request.signed_url(&HmacSigner::new(key))
    }

    pub fn expire_after(&self, seconds: i64) -> Timestamp {
        timestamp::expire_after(&self.clock, seconds)
    }

    /// Local wall time for `timestamp`
    pub fn decode_timestamp(
        &self,
        timestamp: Timestamp,
    ) -> Result<chrono::NaiveDateTime, QnlinkError> {
        timestamp::from_timestamp(&self.clock, timestamp)
    }

    // ========================================================================
    // Downloads
    // ========================================================================

    /// Download `url` to `save_as` without blocking the runtime
    pub async fn download(&self, url: &str, save_as: &Path) -> Result<FetchResult, QnlinkError> {
        let manager = DownloadManager::from_settings(&self.settings)?;
        Ok(manager.download_async(url, save_as).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> QnlinkCore {
        QnlinkCore::new(Settings {
            access_key: "ak".into(),
            secret_key: "sk".into(),
            ..Settings::default()
        })
    }

    #[test]
    fn test_sign_url_uses_settings_credentials() {
        let signed = core().sign_url("http://a.b.com/v.mp4", Some(60)).unwrap();
        assert!(signed.starts_with("http://a.b.com/v.mp4?e="));
        assert!(signed.contains("&token=ak:"));
    }

    #[test]
    fn test_sign_url_without_credentials_fails() {
        let core = QnlinkCore::new(Settings::default());
        let err = core.sign_url("http://a.b.com/v.mp4", None).unwrap_err();
        assert!(matches!(err, QnlinkError::Configuration(_)));
    }

    #[test]
    fn test_anti_leech_url_until_deadline() {
        let deadline = chrono::Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let url = core()
            .anti_leech_url_until("http://cdn.example.com/a/b.mp4", "key", &deadline)
            .unwrap();

        let (base, query) = url.split_once('?').unwrap();
        assert_eq!(base, "http://cdn.example.com/a/b.mp4");
        let params: Vec<_> = query.split('&').collect();
        assert_eq!(params.len(), 2);
        // 20-byte HMAC-SHA1 digest in hex
        assert_eq!(params[0].strip_prefix("sign=").unwrap().len(), 40);
        let t = i64::from_str_radix(params[1].strip_prefix("t=").unwrap(), 16).unwrap();
        assert!(t > core().expire_after(0).as_secs());
    }

    #[test]
    fn test_decode_timestamp_round_trips_expiry() {
        let core = core();
        let expiry = core.expire_after(90);
        let local = core.decode_timestamp(expiry).unwrap();
        assert_eq!(timestamp::to_timestamp(&core.clock, local), expiry);
    }
}

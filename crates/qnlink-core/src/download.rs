//! Simple download to a local file
//!
//! Key principles:
//! - One GET per call, no retries, no resume
//! - Failures never escape: they end up in the returned `FetchResult`
//! - The destination is only touched after a 2xx response
//! - The file handle is closed on every path before returning

use crate::clock::{Clock, WallClock};
use crate::error::QnlinkError;
use crate::transport::{AsyncTransport, BlockingHttpTransport, HttpResponse, HttpTransport, Transport};
use anyhow::Context;
use bytes::Bytes;
use qnlink_types::{http_code, FetchResult, Settings};
use reqwest::header::HeaderMap;
use std::io::Write;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

/// Downloads URLs to local files through a transport
#[derive(Debug, Clone)]
pub struct DownloadManager<T, C = WallClock> {
    transport: T,
    clock: C,
}

impl<T> DownloadManager<T, WallClock> {
    pub fn new(transport: T) -> Self {
        Self::with_clock(transport, WallClock)
    }
}

impl DownloadManager<BlockingHttpTransport, WallClock> {
    /// Blocking manager over `reqwest::blocking`, configured from `settings`
    pub fn blocking(settings: &Settings) -> Result<Self, QnlinkError> {
        Ok(Self::new(BlockingHttpTransport::new(settings)?))
    }
}

impl DownloadManager<HttpTransport, WallClock> {
    /// Async manager over `reqwest`, configured from `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self, QnlinkError> {
        Ok(Self::new(HttpTransport::new(settings)?))
    }
}

impl<T, C: Clock> DownloadManager<T, C> {
    pub fn with_clock(transport: T, clock: C) -> Self {
        Self { transport, clock }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Record status and payload; hand back the body only for a 2xx status
    fn record_response(&self, result: &mut FetchResult, response: HttpResponse) -> Option<Bytes> {
        result.code = i32::from(response.status);
        result.payload = Some(response.body.clone());

        if response.is_success() {
            Some(response.body)
        } else {
            warn!("Download failed with status {}", response.status);
            result.append_log(
                self.clock.now(),
                &format!("[Download] Error: code = {}", result.code),
            );
            None
        }
    }

    fn finish(&self, result: &mut FetchResult, save_as: &Path, outcome: anyhow::Result<bool>) {
        match outcome {
            Ok(true) => {
                info!("Saved {} bytes to {}", result.payload_len(), save_as.display());
                result.append_log(
                    self.clock.now(),
                    &format!("[Download] Success: (Remote file) ==> \"{}\"", save_as.display()),
                );
            }
            Ok(false) => {}
            Err(err) => self.record_exception(result, &err),
        }
    }

    /// One line per cause, outermost first
    fn record_exception(&self, result: &mut FetchResult, err: &anyhow::Error) {
        error!("Download failed: {:#}", err);
        result.code = http_code::USER_EXCEPTION;

        for (depth, cause) in err.chain().enumerate() {
            let line = if depth == 0 {
                format!("[Download] Error: {}", cause)
            } else {
                format!("[Download] Caused by: {}", cause)
            };
            result.append_log(self.clock.now(), &line);
        }
    }
}

impl<T: Transport, C: Clock> DownloadManager<T, C> {
    /// Fetch `url` and save the body as `save_as`, blocking the caller
    pub fn download(&self, url: &str, save_as: impl AsRef<Path>) -> FetchResult {
        let save_as = save_as.as_ref();
        let mut result = FetchResult::new();
        info!("Downloading {} to {}", url, save_as.display());

        let outcome = match self.transport.get(url, &HeaderMap::new(), true) {
            Ok(response) => match self.record_response(&mut result, response) {
                Some(body) => write_file(save_as, &body).map(|()| true),
                None => Ok(false),
            },
            Err(err) => Err(err),
        };

        self.finish(&mut result, save_as, outcome);
        result
    }
}

impl<T: AsyncTransport, C: Clock> DownloadManager<T, C> {
    /// Same as [`download`](DownloadManager::download) without blocking the caller.
    ///
    /// Nothing is requested until the future is polled. Dropping the future
    /// early yields no result at all, never a successful one.
    pub async fn download_async(&self, url: &str, save_as: impl AsRef<Path>) -> FetchResult {
        let save_as = save_as.as_ref();
        let mut result = FetchResult::new();
        info!("Downloading {} to {}", url, save_as.display());

        let outcome = match self.transport.get(url, &HeaderMap::new(), true).await {
            Ok(response) => match self.record_response(&mut result, response) {
                Some(body) => write_file_async(save_as, &body).await.map(|()| true),
                None => Ok(false),
            },
            Err(err) => Err(err),
        };

        self.finish(&mut result, save_as, outcome);
        result
    }
}

fn write_file(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(data)
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to write {}", path.display()))
}

async fn write_file_async(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(data)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.sync_all()
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

//! HTTP transport used by the download manager
//!
//! Transports surface every failure as an error; interpreting status codes
//! is left to the caller.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use qnlink_types::Settings;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;

/// Status and body of a completed GET
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking GET
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, headers: &HeaderMap, follow_redirects: bool) -> Result<HttpResponse>;
}

/// Non-blocking GET
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        follow_redirects: bool,
    ) -> Result<HttpResponse>;
}

/// [`Transport`] over `reqwest::blocking`.
///
/// Must not be created or dropped from inside an async runtime.
#[derive(Debug, Clone)]
pub struct BlockingHttpTransport {
    client: reqwest::blocking::Client,
    no_redirect_client: reqwest::blocking::Client,
}

impl BlockingHttpTransport {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let builder = || {
            reqwest::blocking::Client::builder()
                .user_agent(settings.user_agent.clone())
                .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
                .timeout(Duration::from_secs(settings.request_timeout_secs))
        };

        Ok(Self {
            client: builder().build()?,
            no_redirect_client: builder().redirect(Policy::none()).build()?,
        })
    }
}

impl Transport for BlockingHttpTransport {
    fn get(&self, url: &str, headers: &HeaderMap, follow_redirects: bool) -> Result<HttpResponse> {
        let client = if follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        debug!("GET {}", url);
        let response = client
            .get(url)
            .headers(headers.clone())
            .send()
            .with_context(|| format!("GET {} failed", url))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .with_context(|| format!("reading body of {} failed", url))?;

        Ok(HttpResponse { status, body })
    }
}

/// [`AsyncTransport`] over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    no_redirect_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let builder = || {
            reqwest::Client::builder()
                .user_agent(settings.user_agent.clone())
                .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
                .timeout(Duration::from_secs(settings.request_timeout_secs))
        };

        Ok(Self {
            client: builder().build()?,
            no_redirect_client: builder().redirect(Policy::none()).build()?,
        })
    }
}

#[async_trait]
impl AsyncTransport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        follow_redirects: bool,
    ) -> Result<HttpResponse> {
        let client = if follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        debug!("GET {}", url);
        let response = client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {} failed", url))?;

        Ok(HttpResponse { status, body })
    }
}

//! HTTP seam for the dataset loader.
//!
//! The loader only needs "GET this URL within this timeout"; keeping that
//! behind a trait lets tests count requests and script responses.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{AppError, FailureReason};

/// Raw response: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    /// Issue a single GET. No retries.
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FailureReason>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FailureReason> {
        (**self).get(url, timeout)
    }
}

/// Blocking `reqwest` transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build the default client; fails only when the TLS backend cannot start.
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client (proxy, TLS roots, user agent).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FailureReason> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| FailureReason::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| FailureReason::Network(format!("failed to read body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

/// Transport that never connects; every source takes its fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

impl Transport for OfflineTransport {
    fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, FailureReason> {
        Err(FailureReason::Network(format!("offline mode, skipped {url}")))
    }
}

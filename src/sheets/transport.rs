//! HTTP transport for the spreadsheet API.
//!
//! The transport only moves bytes; interpreting statuses and bodies is the
//! client's job.  With `opaque_writes` enabled a `POST` reports
//! [`RawResponse::Opaque`] once the request was delivered, whatever the
//! server answered.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SheetsConfig;

/// Errors raised below the response-classification layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetsError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("spreadsheet API returned HTTP {0}")]
    Status(u16),

    /// The body was not the expected JSON.
    #[error("unexpected response body: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SheetsError {
    fn from(e: reqwest::Error) -> Self {
        SheetsError::Network(e.to_string())
    }
}

/// What came back from one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResponse {
    /// Delivered, but the transport does not look at the reply.
    Opaque,
    /// Status code and raw body text.
    Http { status: u16, body: String },
}

/// The two calls the spreadsheet API supports.
#[async_trait]
pub trait SheetTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, SheetsError>;

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<RawResponse, SheetsError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    opaque_writes: bool,
}

impl HttpTransport {
    pub fn from_config(config: &SheetsConfig) -> Self {
        // The save endpoint answers through a redirect; reqwest follows it by default.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            opaque_writes: config.opaque_writes,
        }
    }
}

async fn into_raw(response: reqwest::Response) -> Result<RawResponse, SheetsError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(RawResponse::Http { status, body })
}

#[async_trait]
impl SheetTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, SheetsError> {
        log::debug!("sheets: GET {url}");
        let response = self.client.get(url).send().await?;
        into_raw(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<RawResponse, SheetsError> {
        log::debug!("sheets: POST {url}");
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        if self.opaque_writes {
            return Ok(RawResponse::Opaque);
        }
        into_raw(response).await
    }
}

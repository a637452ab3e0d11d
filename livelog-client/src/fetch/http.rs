//! Buffer fetcher over HTTP.

use async_trait::async_trait;
use livelog_types::LogRecord;

use super::{decode_buffer, BufferFetcher, BufferFormat, FetchRequest};
use crate::error::ClientError;

/// Fetches the console buffer with `GET` and bearer authentication.
#[derive(Debug, Clone, Default)]
pub struct HttpBufferFetcher {
    http: reqwest::Client,
    format: BufferFormat,
}

impl HttpBufferFetcher {
    /// Create a fetcher expecting `format` elements.
    pub fn new(format: BufferFormat) -> Self {
        Self {
            http: reqwest::Client::new(),
            format,
        }
    }

    /// Use an existing HTTP client.
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Element format this fetcher expects.
    pub fn format(&self) -> BufferFormat {
        self.format
    }
}

#[async_trait]
impl BufferFetcher for HttpBufferFetcher {
    async fn fetch_buffer(&self, request: &FetchRequest) -> Result<Vec<LogRecord>, ClientError> {
        let response = self
            .http
            .get(&request.url)
            .bearer_auth(&request.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                path: response.url().path().to_string(),
            });
        }

        let items: Vec<serde_json::Value> = response.json().await?;
        tracing::debug!(instance = %request.target, entries = items.len(), "console buffer fetched");
        Ok(decode_buffer(items, self.format, &request.target))
    }
}

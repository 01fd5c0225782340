//! WordPress REST API client
//!
//! Fetches raw JSON documents from a `wp-json/wp/v2` style endpoint. The
//! client does not interpret responses; shaping happens in `site`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;

use super::{ContentSource, FetchError, Params};

/// Default API root for the RSCN CMS
pub const DEFAULT_API_URL: &str = "https://cavundur.online/wp-json/wp/v2";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for reading content from a WordPress REST API
#[derive(Debug, Clone)]
pub struct WordPressClient {
    client: Client,
    base_url: String,
}

impl WordPressClient {
    /// Create a new client for `base_url` with the given request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a new client with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// API root this client talks to, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path, with or without a leading slash
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[async_trait]
impl ContentSource for WordPressClient {
    async fn fetch(&self, endpoint: &str, params: &Params) -> Result<Value, FetchError> {
        let url = self.endpoint_url(endpoint);
        tracing::debug!(%url, "requesting content");

        let response = self
            .client
            .get(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::NOT_FOUND {
                tracing::debug!(%url, "content not found");
            }
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

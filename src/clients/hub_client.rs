//! Home Assistant smart-home API client
//!
//! Forwards skill directives to the hub through the Supervisor proxy.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;

use crate::core::models::HubResponse;
use crate::errors::BridgeError;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait SmartHomeApi: Send + Sync {
    /// Any HTTP status counts as an answer; only transport failures are errors.
    async fn forward(&self, body: &str) -> Result<HubResponse, BridgeError>;
}

pub struct HubClient {
    http: Client,
    url: String,
    token: String,
}

impl HubClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self, BridgeError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
            token: token.into(),
        })
    }

    fn headers(&self) -> Result<HeaderMap, BridgeError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| BridgeError::ConfigError(format!("SUPERVISOR_TOKEN: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl SmartHomeApi for HubClient {
    async fn forward(&self, body: &str) -> Result<HubResponse, BridgeError> {
        let resp = self
            .http
            .post(&self.url)
            .headers(self.headers()?)
            .body(body.to_string())
            .send()
            .await?;

        let status = resp.status().as_u16();
        let data = resp.text().await?;
        Ok(HubResponse { status, data })
    }
}

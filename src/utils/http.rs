//! HTTP client utilities.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::ProviderError;

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, ProviderError> {
        Self::from_config(&HttpConfig::default())
    }

    /// Create a client from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> Result<Self, ProviderError> {
        let user_agent = config.user_agent.clone().unwrap_or_else(|| {
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
        });

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Send `request` and decode a JSON body.
    ///
    /// `404 Not Found` is "no data" (`Ok(None)`); any other non-success status
    /// is an [`ProviderError::Api`] error.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        provider: &str,
    ) -> Result<Option<T>, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("{} request failed: {}", provider, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Api(format!(
                "{} returned status: {}",
                provider, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(format!("{} body read failed: {}", provider, e)))?;

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| ProviderError::Parse(format!("{}: {}", provider, e)))
    }
}

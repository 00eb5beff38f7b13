//! HTTP transport for provider requests.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::errors::MarketDataError;

/// Default Alpha Vantage query endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues one provider request and returns the raw response body.
///
/// `params` are the function-specific query parameters; implementations add
/// credentials themselves. Non-success statuses must surface as
/// [`MarketDataError::Http`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, params: &[(&str, &str)]) -> Result<String, MarketDataError>;
}

/// reqwest-backed transport that appends the `apikey` parameter.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport against the public Alpha Vantage endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a transport against a custom endpoint (proxies, test servers).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(REQUEST_TIMEOUT),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Replace the per-request timeout (default 30s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    fn build_url(&self, params: &[(&str, &str)]) -> Result<reqwest::Url, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &self.api_key));

        reqwest::Url::parse_with_params(&self.base_url, &all_params)
            .map_err(|e| MarketDataError::InvalidResponse(format!("Failed to build URL: {}", e)))
    }

    /// Render `url` for logging with the `apikey` value masked.
    fn redact(url: &reqwest::Url) -> String {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| {
                let value = if key == "apikey" {
                    "***".to_string()
                } else {
                    value.into_owned()
                };
                (key.into_owned(), value)
            })
            .collect();

        let mut redacted = url.clone();
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
        redacted.to_string()
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let url = self.build_url(params)?;
        debug!("Market data request: {}", Self::redact(&url));

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout
            } else {
                MarketDataError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Http {
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(MarketDataError::Network)
    }
}

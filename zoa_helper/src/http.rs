use std::time::Duration;

use reqwest::{
    Client, IntoUrl,
    header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA},
};
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::{
    config::ZoaConfig,
    error::{ApplicationError, ApplicationResult},
};

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Thin wrapper around [`reqwest::Client`] that never serves cached weather
/// and retries failed requests a bounded number of times.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: Client,
    retries: u32,
}

impl HttpClient {
    pub fn new(timeout: Duration, retries: u32) -> ApplicationResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("zoa_helper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            retries: retries.max(1),
        })
    }

    pub fn from_config(config: &ZoaConfig) -> ApplicationResult<Self> {
        Self::new(config.http_timeout(), config.http_retries())
    }

    #[tracing::instrument(skip(self, query))]
    pub async fn get_text<Q: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
    ) -> ApplicationResult<String> {
        let mut first_error = None;
        for attempt in 1..=self.retries {
            match self.try_get_text(url, query).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if attempt == self.retries {
                        error!(attempt, "Failed to get {url}: {e}");
                    } else {
                        warn!(attempt, "Failed to get {url}: {e}");
                        tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    }
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error
            .map(Into::into)
            .unwrap_or_else(|| ApplicationError::NoResponse(url.to_string())))
    }

    pub async fn get_json<T: DeserializeOwned, Q: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
    ) -> ApplicationResult<T> {
        let text = self.get_text(url, query).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn try_get_text<U: IntoUrl, Q: serde::Serialize + ?Sized>(
        &self,
        url: U,
        query: &Q,
    ) -> reqwest::Result<String> {
        self.client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_retries_still_tries_once() {
        let client = HttpClient::new(Duration::from_secs(1), 0).unwrap();
        assert_eq!(client.retries, 1);
    }

    #[test]
    fn test_client_from_config() {
        let config = ZoaConfig::new_for_test();
        let client = HttpClient::from_config(&config).unwrap();
        assert_eq!(client.retries, 3);
    }

    #[tokio::test]
    async fn test_unreachable_host_returns_error() {
        let client = HttpClient::new(Duration::from_millis(200), 1).unwrap();
        let result = client
            .get_text("http://127.0.0.1:9/unreachable", &[("ids", "KSFO")])
            .await;
        assert!(result.is_err());
    }
}

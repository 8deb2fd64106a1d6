//! `reqwest` client for the governor server's HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{
    GovernorApi, InterfaceHistory, InterfaceStats, LogTail, MonitorApi, RawInterfaceStats,
    ResetRequest, StatusPayload, ToggleResponse, UsageHistory,
};
use crate::data::PolicyConfig;
use crate::error::ApiError;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP implementation of both API traits.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    /// Create a new builder for configuring the client.
    pub fn builder() -> HttpApiBuilder {
        HttpApiBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        self.base.as_str()
    }

    /// Build a URL from path segments, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Http(format!("endpoint cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        decode(check(response)?).await
    }

    async fn post<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<Response, ApiError> {
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        check(response)
    }
}

fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            code: status.as_u16(),
        });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

#[async_trait]
impl MonitorApi for HttpApi {
    async fn interfaces(&self) -> Result<Vec<String>, ApiError> {
        self.get(self.url(&["api", "monitor", "interfaces"])?).await
    }

    async fn interface_stats(&self, id: &str) -> Result<InterfaceStats, ApiError> {
        let url = self.url(&["api", "monitor", "stats", id])?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        // 404 bodies still carry the server's error text
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            let raw: RawInterfaceStats = decode(response).await?;
            return Err(ApiError::Remote(
                raw.error.unwrap_or_else(|| format!("interface {id} not found")),
            ));
        }
        let raw: RawInterfaceStats = decode(check(response)?).await?;
        match raw.error {
            Some(message) => Err(ApiError::Remote(message)),
            None => Ok(raw.stats),
        }
    }

    async fn interface_history(&self, id: &str) -> Result<InterfaceHistory, ApiError> {
        let history: InterfaceHistory =
            self.get(self.url(&["api", "monitor", "history", id])?).await?;
        if !history.is_aligned() {
            return Err(ApiError::Parse(format!(
                "history arrays differ in length: {} timestamps, {} sent, {} recv",
                history.timestamp.len(),
                history.sent.len(),
                history.recv.len()
            )));
        }
        Ok(history)
    }
}

#[async_trait]
impl GovernorApi for HttpApi {
    async fn status(&self) -> Result<StatusPayload, ApiError> {
        self.get(self.url(&["api", "downonly", "status"])?).await
    }

    async fn toggle(&self) -> Result<ToggleResponse, ApiError> {
        let url = self.url(&["api", "downonly", "toggle"])?;
        decode(self.post(url, &serde_json::json!({})).await?).await
    }

    async fn usage_history(&self, month: u32) -> Result<UsageHistory, ApiError> {
        let mut url = self.url(&["api", "downonly", "history"])?;
        url.query_pairs_mut()
            .append_pair("month", &month.to_string());
        self.get(url).await
    }

    async fn logs(&self) -> Result<LogTail, ApiError> {
        self.get(self.url(&["api", "downonly", "logs"])?).await
    }

    async fn load_config(&self) -> Result<PolicyConfig, ApiError> {
        self.get(self.url(&["api", "downonly", "config"])?).await
    }

    async fn save_config(&self, config: &PolicyConfig) -> Result<(), ApiError> {
        self.post(self.url(&["api", "downonly", "config"])?, config)
            .await?;
        Ok(())
    }

    async fn reset_config(&self) -> Result<(), ApiError> {
        let body = ResetRequest {
            reset_to_default: true,
        };
        self.post(self.url(&["api", "downonly", "config"])?, &body)
            .await?;
        Ok(())
    }
}

/// Builder for [`HttpApi`].
#[derive(Debug, Default)]
pub struct HttpApiBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl HttpApiBuilder {
    /// Set the server base URL (e.g., "http://127.0.0.1:8080").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the per-request timeout (default: 5 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client. Fails on an unparseable endpoint.
    pub fn build(self) -> anyhow::Result<HttpApi> {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let base = Url::parse(&endpoint)
            .map_err(|e| anyhow::anyhow!("invalid endpoint '{}': {}", endpoint, e))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("invalid endpoint '{}': not a base URL", endpoint);
        }

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(HttpApi { client, base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let api = HttpApi::builder().build().unwrap();
        assert_eq!(api.endpoint(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_builder_rejects_bad_endpoint() {
        assert!(HttpApi::builder().endpoint("not a url").build().is_err());
        assert!(HttpApi::builder().endpoint("mailto:x@y.z").build().is_err());
    }

    #[test]
    fn test_url_encodes_interface_ids() {
        let api = HttpApi::builder()
            .endpoint("http://gov.local:9000")
            .build()
            .unwrap();
        let url = api.url(&["api", "monitor", "stats", "wg0/peer 1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://gov.local:9000/api/monitor/stats/wg0%2Fpeer%201"
        );
    }

    #[test]
    fn test_url_under_path_prefix() {
        let api = HttpApi::builder()
            .endpoint("http://gov.local/tools/")
            .build()
            .unwrap();
        let url = api.url(&["api", "downonly", "status"]).unwrap();
        assert_eq!(url.as_str(), "http://gov.local/tools/api/downonly/status");
    }
}

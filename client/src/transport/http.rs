//! HTTPS transport backed by reqwest.

use async_trait::async_trait;
use currencycloud_common::{CurrencyCloudError, Result};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{ApiRequest, Method, Response, Transport};
use crate::config::ClientConfig;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Sends requests to the Currencycloud API over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for the configured environment.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.effective_base_url();
        Url::parse(base_url).map_err(|e| {
            CurrencyCloudError::Configuration(format!("Invalid base URL `{}`: {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CurrencyCloudError::Configuration(format!("HTTP client build error: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&url)
            .map_err(|e| CurrencyCloudError::Configuration(format!("Invalid URL `{}`: {}", url, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(request = %request.request_line()))]
    async fn exchange(&self, request: &ApiRequest) -> Result<Response> {
        let url = self.url_for(&request.path)?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url).query(&request.params),
            Method::Post => self.client.post(url).form(&request.params),
        };

        if let Some(token) = &request.auth_token {
            builder = builder.header(AUTH_TOKEN_HEADER, token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CurrencyCloudError::Network(format!("{} timed out", request.request_line()))
            } else {
                CurrencyCloudError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CurrencyCloudError::Network(e.to_string()))?;

        debug!(status = status.as_u16(), bytes = bytes.len(), "Response received");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(body) => body,
                // Error pages from proxies are not JSON; keep the status.
                Err(_) if !status.is_success() => Value::Null,
                Err(e) => {
                    return Err(CurrencyCloudError::UnexpectedResponse(format!(
                        "{} returned invalid JSON: {}",
                        request.request_line(),
                        e
                    )))
                }
            }
        };

        Ok(Response::new(status.as_u16(), body))
    }
}
